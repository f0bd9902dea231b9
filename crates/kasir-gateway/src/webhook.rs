//! # Webhook Authentication and Parsing
//!
//! The gateway signs every notification with HMAC-SHA256 over the raw body
//! using the shared webhook secret and sends the hex digest in a header
//! (`x-callback-signature` by default).
//!
//! ```text
//! raw body ──► HMAC-SHA256(secret) ──► compare (constant time) with hex header
//!                                          │
//!                          mismatch ◄──────┴──────► Notification::parse(raw body)
//!                     InvalidSignature
//! ```
//!
//! Verification always runs on the exact bytes received, before any JSON
//! parsing.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{GatewayError, GatewayResult};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Signature Verification
// =============================================================================

/// Checks notification signatures against the shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"***")
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        SignatureVerifier {
            secret: secret.into(),
        }
    }

    /// Verifies `signature_hex` against the HMAC of `payload`.
    ///
    /// ## Errors
    /// * `InvalidSignature` - empty secret, non-hex header, or digest mismatch
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> GatewayResult<()> {
        if self.secret.is_empty() {
            return Err(GatewayError::InvalidSignature);
        }

        let signature = hex::decode(signature_hex.trim()).map_err(|_| GatewayError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(&signature)
            .map_err(|_| GatewayError::InvalidSignature)
    }

    /// Hex signature of `payload`, as the gateway would send it.
    pub fn sign(&self, payload: &[u8]) -> GatewayResult<String> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> GatewayResult<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| GatewayError::InvalidSignature)
    }
}

// =============================================================================
// Notification
// =============================================================================

/// A payment status notification.
///
/// `order_id` is the reference sent at session creation (the invoice
/// number), i.e. the payment's `provider_reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    /// Decimal string, e.g. `"15000.00"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
}

impl Notification {
    /// Parses a raw (already verified) body.
    pub fn parse(payload: &[u8]) -> GatewayResult<Self> {
        let notification: Notification = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::MalformedNotification(e.to_string()))?;

        if notification.order_id.trim().is_empty() {
            return Err(GatewayError::MalformedNotification(
                "order_id is empty".to_string(),
            ));
        }
        Ok(notification)
    }

    /// `gross_amount` in minor units of a currency with `currency_decimals`
    /// fraction digits. `None` when the notification carries no amount.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_gateway::Notification;
    ///
    /// let n = Notification::parse(br#"{"order_id":"INV/1","transaction_status":"settlement","gross_amount":"15000.00"}"#).unwrap();
    /// assert_eq!(n.amount_minor(0).unwrap(), Some(15_000));
    /// assert_eq!(n.amount_minor(2).unwrap(), Some(1_500_000));
    /// ```
    pub fn amount_minor(&self, currency_decimals: u8) -> GatewayResult<Option<i64>> {
        match &self.gross_amount {
            Some(raw) => parse_minor(raw, currency_decimals).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_minor(raw: &str, decimals: u8) -> GatewayResult<i64> {
    let malformed = || GatewayError::MalformedNotification(format!("invalid gross_amount '{}'", raw));

    let raw = raw.trim();
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let decimals = decimals as usize;
    // Digits past the currency's precision must be zero.
    if fraction.len() > decimals && fraction[decimals..].bytes().any(|b| b != b'0') {
        return Err(malformed());
    }

    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    for i in 0..decimals {
        digits.push(fraction.as_bytes().get(i).map(|b| *b as char).unwrap_or('0'));
    }

    digits.parse::<i64>().map_err(|_| malformed())
}

// =============================================================================
// Unit Tests
// =============================================================================
