//! # Gateway Error Types

use thiserror::Error;

/// Failures talking to, or hearing from, the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure: DNS, connection refused, TLS, reset.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    /// No response within the configured timeout.
    #[error("Payment gateway timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The gateway answered with a non-2xx status.
    #[error("Payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 2xx, but the body is not what the gateway documents.
    #[error("Invalid response from payment gateway: {0}")]
    InvalidResponse(String),

    /// Webhook signature missing or wrong.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook body is not a notification we understand.
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),
}

impl GatewayError {
    /// Whether checkout should report the gateway as unavailable.
    ///
    /// Every session-creation failure counts: the order is rolled back in
    /// all of these cases.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable(_)
                | GatewayError::Timeout { .. }
                | GatewayError::Rejected { .. }
                | GatewayError::InvalidResponse(_)
        )
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
