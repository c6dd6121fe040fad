//! Notification schedule repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_entity::schedule::{NotificationSchedule, ScheduleUpdate};

use crate::store::ScheduleStore;

/// Repository for the `notification_schedules` table.
#[derive(Debug, Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    /// Create a new schedule repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn get(&self, notification_type: &str) -> AppResult<Option<NotificationSchedule>> {
        sqlx::query_as::<_, NotificationSchedule>(
            "SELECT * FROM notification_schedules WHERE notification_type = $1",
        )
        .bind(notification_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read schedule", e))
    }

    async fn list(&self) -> AppResult<Vec<NotificationSchedule>> {
        sqlx::query_as::<_, NotificationSchedule>(
            "SELECT * FROM notification_schedules ORDER BY notification_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list schedules", e))
    }

    async fn update(
        &self,
        notification_type: &str,
        data: ScheduleUpdate,
    ) -> AppResult<NotificationSchedule> {
        sqlx::query_as::<_, NotificationSchedule>(
            "UPDATE notification_schedules SET schedule_cron = $2, timezone = $3, \
             is_enabled = $4, updated_at = NOW() WHERE notification_type = $1 RETURNING *",
        )
        .bind(notification_type)
        .bind(&data.schedule_cron)
        .bind(&data.timezone)
        .bind(data.is_enabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update schedule", e))?
        .ok_or_else(|| {
            AppError::not_found(format!("No schedule configured for '{notification_type}'"))
        })
    }

    async fn mark_started(&self, notification_type: &str, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_schedules SET last_run = $2, updated_at = NOW() \
             WHERE notification_type = $1",
        )
        .bind(notification_type)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record last run", e))?;
        Ok(())
    }

    async fn set_next_run(
        &self,
        notification_type: &str,
        next_run: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_schedules SET next_run = $2, updated_at = NOW() \
             WHERE notification_type = $1",
        )
        .bind(notification_type)
        .bind(next_run)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record next run", e))?;
        Ok(())
    }
}
