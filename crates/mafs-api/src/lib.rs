//! # mafs-api
//!
//! HTTP API layer for the Mars Abnormal Finding System built on Axum.
//!
//! Provides the REST endpoints under `/api`, the LINE webhook, middleware
//! (request logging, CORS, error detail exposure), extractors and DTOs.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
