//! Payment gateway types and data structures
//!
//! Common types shared by the gateway client and the donation flows.

use serde::{Deserialize, Serialize};

/// Request for creating a hosted payment link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLinkRequest {
    /// Amount in the smallest currency unit (e.g., kobo for NGN)
    pub amount: i64,
    /// Currency code (NGN, ZMW, USD, etc.)
    pub currency: String,
    /// Donor email address
    pub email: String,
    /// Donor first name
    pub first_name: String,
    /// Donor last name
    pub last_name: String,
    /// Optional donor phone number
    pub phone: Option<String>,
    /// Unique reference for this donation attempt (for idempotency)
    pub reference: String,
    /// URL the gateway redirects the donor to after checkout
    pub callback_url: String,
    /// Additional metadata echoed back by the gateway
    pub metadata: Option<serde_json::Value>,
}

/// Hosted payment link returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Checkout URL the donor must be redirected to
    pub payment_url: String,
    /// The merchant reference this link was created for
    pub reference: String,
    /// Provider-assigned secondary reference, when present
    pub lenco_reference: Option<String>,
}

/// Normalized result of a verify-by-reference call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub reference: String,
    /// Amount in minor units as reported by the provider
    pub amount_minor: i64,
    /// Amount in major units. The gateway client is the single point where
    /// minor-to-major division happens; callers must not re-divide.
    pub amount_major: f64,
    pub status: PaymentStatus,
    /// The provider's literal status token, kept for diagnostics
    pub raw_status: String,
    pub paid_at: Option<String>,
    pub failure_reason: Option<String>,
}

/// Inbound webhook notification body
///
/// Parsed only after the signature check has passed. Unknown `event` values
/// are acknowledged, never treated as errors.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    pub event: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

/// Payment fields carried by a webhook notification
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub reference: Option<String>,
    pub amount: Option<i64>,
    pub status: Option<String>,
    #[serde(default, alias = "paidAt")]
    pub paid_at: Option<String>,
    #[serde(default, alias = "failureReason")]
    pub failure_reason: Option<String>,
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created at initiation, not yet settled by the provider
    Pending,
    /// Provider confirmed settlement
    Success,
    /// Provider reported anything other than settlement
    Failed,
    /// Provider response was malformed or its status token unrecognized
    Unknown,
}

impl PaymentStatus {
    /// Map a provider status token. Only the literal "success" token counts
    /// as success; every other token is failure, never silently trusted.
    pub fn from_provider(token: &str) -> Self {
        match token {
            "success" => PaymentStatus::Success,
            _ => PaymentStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Unknown => "unknown",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

/// Convert a major-unit amount to minor units, rounding half away from zero.
///
/// Returns `None` unless the input is finite, positive, and the rounded
/// value is representable as a positive i64.
pub fn major_to_minor(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    let minor = (amount * 100.0).round();
    if minor < 1.0 || minor > i64::MAX as f64 {
        return None;
    }

    Some(minor as i64)
}

/// Convert a minor-unit amount back to major units.
pub fn minor_to_major(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Human-readable amount with currency symbol and thousands separators,
/// e.g. `₦5,000.00`.
pub fn format_major(amount: f64, currency: &str) -> String {
    let symbol = match currency {
        "NGN" => "₦",
        "ZMW" => "K",
        "GHS" => "₵",
        "USD" => "$",
        _ => "",
    };

    let cents = (amount * 100.0).round() as i64;
    let whole = cents / 100;
    let fraction = (cents % 100).abs();

    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if whole < 0 { "-" } else { "" };
    format!("{}{}{}.{:02}", sign, symbol, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_to_minor_rounds_half_away_from_zero() {
        assert_eq!(major_to_minor(50.0), Some(5000));
        // 0.125 is exact in binary, so this exercises the half case itself
        assert_eq!(major_to_minor(0.125), Some(13));
        assert_eq!(major_to_minor(99.99), Some(9999));
        assert_eq!(major_to_minor(0.01), Some(1));
        assert_eq!(major_to_minor(0.005), Some(1));
    }

    #[test]
    fn test_major_to_minor_rejects_non_positive() {
        assert_eq!(major_to_minor(0.0), None);
        assert_eq!(major_to_minor(-25.0), None);
        assert_eq!(major_to_minor(f64::NAN), None);
        assert_eq!(major_to_minor(f64::INFINITY), None);
        // Rounds to zero minor units
        assert_eq!(major_to_minor(0.001), None);
    }

    #[test]
    fn test_minor_round_trip_within_one_cent() {
        for amount in [1.0, 49.99, 123.45, 9_999.01] {
            let minor = major_to_minor(amount).unwrap();
            assert!((minor_to_major(minor) - amount).abs() < 0.01);
        }
    }

    #[test]
    fn test_status_mapping_success_only() {
        assert_eq!(PaymentStatus::from_provider("success"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_provider("abandoned"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_provider("pending"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_provider(""), PaymentStatus::Failed);
    }

    #[test]
    fn test_format_major() {
        assert_eq!(format_major(5000.0, "NGN"), "₦5,000.00");
        assert_eq!(format_major(50.0, "USD"), "$50.00");
        assert_eq!(format_major(1234567.89, "ZMW"), "K1,234,567.89");
        assert_eq!(format_major(0.5, "XYZ"), "0.50");
    }
}
