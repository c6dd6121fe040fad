//! Dashboard aggregates.

pub mod model;

pub use model::{DashboardFilter, DashboardSummary, ReporterCount, StatusCount, TrendPoint};
