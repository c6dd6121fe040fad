//! Form permission administration.

pub mod service;

pub use service::FormPermissionService;
