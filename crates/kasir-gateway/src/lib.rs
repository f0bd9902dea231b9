//! # kasir-gateway: Payment Gateway Adapter
//!
//! Creates remote payment sessions for non-cash orders and authenticates the
//! gateway's asynchronous notifications.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout(wallet)                                                      │
//! │       │ SessionRequest { reference, amount, items }                    │
//! │       ▼                                                                 │
//! │  PaymentGateway::create_session ──HTTP──► provider                     │
//! │       │                                      │                          │
//! │       ▼                                      │  later, at-least-once    │
//! │  SessionDescriptor { provider_reference,     │                          │
//! │                      token, qr_payload,      ▼                          │
//! │                      redirect_url }     POST /api/payments/webhook      │
//! │                                              │                          │
//! │                          SignatureVerifier::verify(raw body, header)   │
//! │                          Notification::parse(raw body)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - the provider-agnostic session types and the
//!   [`PaymentGateway`] trait
//! - [`snap`] - HTTP implementation against a Snap-style REST API
//! - [`webhook`] - signature verification and notification parsing
//! - [`error`] - [`GatewayError`]

pub mod error;
pub mod session;
pub mod snap;
pub mod webhook;

pub use error::{GatewayError, GatewayResult};
pub use session::{PaymentGateway, SessionDescriptor, SessionItem, SessionRequest};
pub use snap::{SnapConfig, SnapGateway};
pub use webhook::{Notification, SignatureVerifier};
