//! Plant hierarchy lookups for the production-unit selector.

pub mod service;

pub use service::HierarchyService;
