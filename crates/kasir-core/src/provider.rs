//! # Provider Status Vocabulary
//!
//! Maps the payment gateway's `transaction_status` / `fraud_status` words to
//! [`PaymentStatus`].
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │  provider says               │  internal                                │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │  settlement                  │  Settled                                 │
//! │  capture + accept / (none)   │  Settled                                 │
//! │  capture + challenge         │  no transition (stays Pending)           │
//! │  capture + deny              │  Denied                                  │
//! │  pending                     │  no transition                           │
//! │  expire                      │  Expired                                 │
//! │  cancel                      │  Canceled                                │
//! │  deny                        │  Denied                                  │
//! │  failure                     │  Failed                                  │
//! │  anything else               │  no transition                           │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

use crate::types::PaymentStatus;

/// Returns the status a notification moves a pending payment to, or `None`
/// when the notification carries no transition.
///
/// Matching is case-insensitive.
///
/// ## Example
/// ```rust
/// use kasir_core::provider::map_provider_status;
/// use kasir_core::PaymentStatus;
///
/// assert_eq!(map_provider_status("settlement", None), Some(PaymentStatus::Settled));
/// assert_eq!(map_provider_status("capture", Some("challenge")), None);
/// ```
pub fn map_provider_status(transaction_status: &str, fraud_status: Option<&str>) -> Option<PaymentStatus> {
    let fraud = fraud_status.map(|f| f.trim().to_ascii_lowercase());

    match transaction_status.trim().to_ascii_lowercase().as_str() {
        "settlement" => Some(PaymentStatus::Settled),
        "capture" => match fraud.as_deref() {
            None | Some("") | Some("accept") => Some(PaymentStatus::Settled),
            Some("deny") => Some(PaymentStatus::Denied),
            _ => None,
        },
        "expire" => Some(PaymentStatus::Expired),
        "cancel" => Some(PaymentStatus::Canceled),
        "deny" => Some(PaymentStatus::Denied),
        "failure" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_vocabulary() {
        assert_eq!(map_provider_status("settlement", None), Some(PaymentStatus::Settled));
        assert_eq!(map_provider_status("CAPTURE", None), Some(PaymentStatus::Settled));
        assert_eq!(
            map_provider_status("capture", Some("accept")),
            Some(PaymentStatus::Settled)
        );
        assert_eq!(map_provider_status("capture", Some("challenge")), None);
        assert_eq!(
            map_provider_status("capture", Some("deny")),
            Some(PaymentStatus::Denied)
        );
    }

    #[test]
    fn test_failure_vocabulary() {
        assert_eq!(map_provider_status("expire", None), Some(PaymentStatus::Expired));
        assert_eq!(map_provider_status("cancel", None), Some(PaymentStatus::Canceled));
        assert_eq!(map_provider_status("deny", None), Some(PaymentStatus::Denied));
        assert_eq!(map_provider_status("failure", None), Some(PaymentStatus::Failed));
    }

    #[test]
    fn test_non_transitions() {
        assert_eq!(map_provider_status("pending", None), None);
        assert_eq!(map_provider_status("authorize", None), None);
        assert_eq!(map_provider_status("", None), None);
    }
}
