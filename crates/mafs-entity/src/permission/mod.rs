//! Per-group form permissions.

pub mod action;
pub mod model;

pub use action::FormAction;
pub use model::{FormPermission, forms};
