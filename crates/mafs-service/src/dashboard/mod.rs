//! KPI dashboard.

pub mod service;

pub use service::DashboardService;
