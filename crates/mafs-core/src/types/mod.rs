//! Core type definitions used across the MAFS workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
