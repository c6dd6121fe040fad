//! Login and per-request authentication.

pub mod service;

pub use service::{AuthService, LoginResult};
