//! Hierarchy repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_entity::hierarchy::{Area, Line, Machine, NewProductionUnit, Plant, ProductionUnit};

use super::{like_pattern, map_write_error};
use crate::store::HierarchyStore;

/// Repository for plant hierarchy lookups and production units.
#[derive(Debug, Clone)]
pub struct HierarchyRepository {
    pool: PgPool,
}

impl HierarchyRepository {
    /// Create a new hierarchy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HierarchyStore for HierarchyRepository {
    async fn plants(&self) -> AppResult<Vec<Plant>> {
        sqlx::query_as::<_, Plant>("SELECT * FROM plants ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list plants", e))
    }

    async fn areas(&self, plant_id: i64) -> AppResult<Vec<Area>> {
        sqlx::query_as::<_, Area>("SELECT * FROM areas WHERE plant_id = $1 ORDER BY code")
            .bind(plant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list areas", e))
    }

    async fn lines(&self, area_id: i64) -> AppResult<Vec<Line>> {
        sqlx::query_as::<_, Line>("SELECT * FROM lines WHERE area_id = $1 ORDER BY code")
            .bind(area_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list lines", e))
    }

    async fn machines(&self, line_id: i64) -> AppResult<Vec<Machine>> {
        sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE line_id = $1 ORDER BY code")
            .bind(line_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list machines", e))
    }

    async fn search_units(
        &self,
        search: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<ProductionUnit>> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);
        sqlx::query_as::<_, ProductionUnit>(
            "SELECT * FROM production_units WHERE is_active \
             AND ($1::text IS NULL OR pucode ILIKE $1 OR name ILIKE $1) \
             ORDER BY pucode LIMIT $2",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to search production units", e)
        })
    }

    async fn find_unit_by_code(&self, pucode: &str) -> AppResult<Option<ProductionUnit>> {
        sqlx::query_as::<_, ProductionUnit>(
            "SELECT * FROM production_units WHERE UPPER(pucode) = UPPER($1)",
        )
        .bind(pucode)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find production unit", e)
        })
    }

    async fn find_unit(&self, id: i64) -> AppResult<Option<ProductionUnit>> {
        sqlx::query_as::<_, ProductionUnit>("SELECT * FROM production_units WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find production unit", e)
            })
    }

    async fn create_unit(&self, data: NewProductionUnit) -> AppResult<ProductionUnit> {
        sqlx::query_as::<_, ProductionUnit>(
            "INSERT INTO production_units (pucode, plant, area, line, machine, name) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.pucode())
        .bind(data.plant.trim().to_uppercase())
        .bind(data.area.trim().to_uppercase())
        .bind(data.line.trim().to_uppercase())
        .bind(data.machine.trim().to_uppercase())
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "A production unit with this code already exists",
                "Failed to create production unit",
            )
        })
    }
}
