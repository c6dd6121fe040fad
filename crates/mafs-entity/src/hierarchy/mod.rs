//! Plant hierarchy entities.

pub mod model;

pub use model::{Area, Line, Machine, NewProductionUnit, Plant, ProductionUnit};
