//! LINE Messaging API integration.

pub mod client;
pub mod signature;
pub mod webhook;

pub use client::{LineClient, LineProfile};
pub use signature::{sign, verify_signature};
pub use webhook::{WebhookEvent, WebhookPayload};
