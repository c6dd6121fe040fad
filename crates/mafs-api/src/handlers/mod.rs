//! Route handlers organized by domain.

pub mod admin;
pub mod attachment;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod hierarchy;
pub mod line;
pub mod ticket;
pub mod user;
