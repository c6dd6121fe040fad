use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mafs_core::AppError;
use mafs_core::result::AppResult;
use mafs_entity::schedule::{NotificationSchedule, ScheduleUpdate};

use super::MemoryStore;
use crate::store::ScheduleStore;

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get(&self, notification_type: &str) -> AppResult<Option<NotificationSchedule>> {
        Ok(self
            .data
            .read()
            .await
            .schedules
            .get(notification_type)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<NotificationSchedule>> {
        Ok(self.data.read().await.schedules.values().cloned().collect())
    }

    async fn update(
        &self,
        notification_type: &str,
        update: ScheduleUpdate,
    ) -> AppResult<NotificationSchedule> {
        let mut data = self.data.write().await;
        let row = data.schedules.get_mut(notification_type).ok_or_else(|| {
            AppError::not_found(format!("No schedule configured for '{notification_type}'"))
        })?;
        row.schedule_cron = update.schedule_cron;
        row.timezone = update.timezone;
        row.is_enabled = update.is_enabled;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn mark_started(&self, notification_type: &str, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(row) = self.data.write().await.schedules.get_mut(notification_type) {
            row.last_run = Some(at);
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_next_run(
        &self,
        notification_type: &str,
        next_run: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        if let Some(row) = self.data.write().await.schedules.get_mut(notification_type) {
            row.next_run = next_run;
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}
