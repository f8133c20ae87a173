//! Donation reference generation

use uuid::Uuid;

/// Prefix that makes donation references self-describing in logs and
/// trivially distinguishable from other reference types.
pub const REFERENCE_PREFIX: &str = "donation_";

/// Generate a globally unique reference for one donation attempt.
///
/// Uniqueness is probabilistic at UUID-v4 entropy; no storage check is made.
/// The reference is generated once at initiation and stays stable across
/// verify and webhook calls for the same attempt.
pub fn generate() -> String {
    format!("{}{}", REFERENCE_PREFIX, Uuid::new_v4())
}

/// Check that a caller-supplied reference has the shape this service issues.
pub fn is_well_formed(reference: &str) -> bool {
    reference
        .strip_prefix(REFERENCE_PREFIX)
        .map(|rest| Uuid::parse_str(rest).is_ok())
        .unwrap_or(false)
}
