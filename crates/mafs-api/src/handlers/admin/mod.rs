//! Admin handlers.

pub mod permissions;
pub mod schedules;
pub mod users;
