//! Payment-provider integration: webhook intake and checkout sessions.

pub mod checkout;
pub mod events;
pub mod signature;
pub mod webhook;

pub use checkout::{CheckoutClient, CheckoutError, CheckoutSessionCreated};
pub use signature::{signature_header, verify_signature, SignatureError};
pub use webhook::{WebhookError, WebhookHandler, WebhookOutcome};
