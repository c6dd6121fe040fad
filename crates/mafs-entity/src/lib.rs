//! # mafs-entity
//!
//! Domain entity models for the Mars Abnormal Finding System. Every struct
//! in this crate represents a database table row or a domain value object.
//! All entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and
//! database entities additionally derive `sqlx::FromRow`.

pub mod dashboard;
pub mod hierarchy;
pub mod permission;
pub mod schedule;
pub mod ticket;
pub mod user;
