//! # mafs-auth
//!
//! Authentication and authorization for the Mars Abnormal Finding System.
//!
//! ## Modules
//!
//! - `jwt`: bearer token issuance and validation
//! - `password`: Argon2id password hashing and policy checks
//! - `guard`: the per-request permission context and its group, level and
//!   form guards

pub mod guard;
pub mod jwt;
pub mod password;

pub use guard::{RequestContext, require_form, require_group, require_level};
pub use jwt::{Claims, IssuedToken, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};
