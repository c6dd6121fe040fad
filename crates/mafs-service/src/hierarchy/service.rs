//! Cascading plant, area, line and machine lookups plus production units.

use std::sync::Arc;

use tracing::info;

use mafs_auth::{RequestContext, require_form};
use mafs_core::error::AppError;
use mafs_core::result::AppResult;
use mafs_database::store::HierarchyStore;
use mafs_entity::hierarchy::{Area, Line, Machine, NewProductionUnit, Plant, ProductionUnit};
use mafs_entity::permission::{FormAction, forms};

/// Default and maximum result counts for unit search.
const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 100;

/// Hierarchy lookups. Reads are open to every authenticated user.
#[derive(Clone)]
pub struct HierarchyService {
    hierarchy: Arc<dyn HierarchyStore>,
}

impl std::fmt::Debug for HierarchyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyService").finish()
    }
}

impl HierarchyService {
    /// Creates a new hierarchy service.
    pub fn new(hierarchy: Arc<dyn HierarchyStore>) -> Self {
        Self { hierarchy }
    }

    pub async fn plants(&self) -> AppResult<Vec<Plant>> {
        self.hierarchy.plants().await
    }

    pub async fn areas(&self, plant_id: i64) -> AppResult<Vec<Area>> {
        self.hierarchy.areas(plant_id).await
    }

    pub async fn lines(&self, area_id: i64) -> AppResult<Vec<Line>> {
        self.hierarchy.lines(area_id).await
    }

    pub async fn machines(&self, line_id: i64) -> AppResult<Vec<Machine>> {
        self.hierarchy.machines(line_id).await
    }

    /// Searches active production units by code or name.
    pub async fn search_units(
        &self,
        search: Option<&str>,
        limit: Option<i64>,
    ) -> AppResult<Vec<ProductionUnit>> {
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.hierarchy.search_units(search, limit).await
    }

    /// Looks a production unit up by its composite code.
    pub async fn unit_by_code(&self, pucode: &str) -> AppResult<ProductionUnit> {
        let code = pucode.trim().to_uppercase();
        self.hierarchy
            .find_unit_by_code(&code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Production unit '{code}' not found")))
    }

    /// Registers a production unit (form `hierarchy`, create).
    pub async fn create_unit(
        &self,
        ctx: &RequestContext,
        data: NewProductionUnit,
    ) -> AppResult<ProductionUnit> {
        require_form(ctx, forms::HIERARCHY, FormAction::Create)?;

        let parts = [&data.plant, &data.area, &data.line, &data.machine];
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(AppError::validation(
                "Plant, area, line and machine codes are all required",
            ));
        }
        if parts.iter().any(|p| p.contains('-')) {
            return Err(AppError::validation("Codes may not contain '-'"));
        }

        let unit = self.hierarchy.create_unit(data).await?;
        info!(user_id = ctx.user_id(), pucode = %unit.pucode, "Production unit created");
        Ok(unit)
    }
}
