//! # mafs-database
//!
//! Persistence for the Mars Abnormal Finding System. Services talk to the
//! store traits in [`store`]; [`repositories`] implements them over a
//! PostgreSQL pool and [`memory`] implements them in process memory for
//! local development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::{DatabasePool, Stores};
pub use memory::MemoryStore;
pub use store::{HierarchyStore, PermissionStore, ScheduleStore, TicketStore, UserStore};
