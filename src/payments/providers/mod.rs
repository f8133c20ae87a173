//! Payment gateway implementations
//!
//! Concrete implementations of the PaymentGateway trait.

pub mod lenco;

pub use lenco::LencoProvider;
