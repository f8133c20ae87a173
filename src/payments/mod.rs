//! Payment gateway integration module
//!
//! Provides the gateway client used to collect donations through Lenco's
//! hosted checkout, plus the shared types, reference generation, and the
//! trait seam the donation flows program against.

pub mod providers;
pub mod reference;
pub mod traits;
pub mod types;
