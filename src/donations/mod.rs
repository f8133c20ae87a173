//! Donation flows
//!
//! Orchestrates the initiation flow (validate, convert to minor units,
//! generate a reference, request a hosted checkout link) and the two
//! verification entry points (client poll and provider webhook push).

pub mod service;

pub use service::{DonationInput, DonationService, InitiatedDonation, VerifiedDonation};
