//! Owns the cron scheduler and one job per notification type.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_cron_scheduler::JobScheduler;
use tracing::{info, warn};

use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_database::store::ScheduleStore;
use mafs_entity::schedule::{NotificationKind, NotificationSchedule, ScheduleUpdate};
use mafs_service::NotificationTask;

use crate::cron;
use crate::job::{ArmState, JobStatus, RunOutcome, ScheduledNotificationJob};

/// Drives the notification jobs.
pub struct NotificationScheduler {
    scheduler: JobScheduler,
    schedules: Arc<dyn ScheduleStore>,
    jobs: HashMap<NotificationKind, Arc<ScheduledNotificationJob>>,
    started: AtomicBool,
}

impl std::fmt::Debug for NotificationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationScheduler")
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .field("started", &self.is_started())
            .finish()
    }
}

impl NotificationScheduler {
    /// Creates the scheduler and one unarmed job per task.
    pub async fn new(
        schedules: Arc<dyn ScheduleStore>,
        tasks: Vec<Arc<dyn NotificationTask>>,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new().await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to create job scheduler", e)
        })?;

        let jobs = tasks
            .into_iter()
            .map(|task| {
                let job =
                    ScheduledNotificationJob::new(Arc::clone(&schedules), task, scheduler.clone());
                (job.kind(), job)
            })
            .collect();

        Ok(Self {
            scheduler,
            schedules,
            jobs,
            started: AtomicBool::new(false),
        })
    }

    /// Arms every job and starts ticking.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler.start().await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to start job scheduler", e)
        })?;
        self.started.store(true, Ordering::Release);

        let mut armed = 0;
        for kind in NotificationKind::ALL {
            if let Some(job) = self.jobs.get(&kind) {
                if job.initialize().await.is_armed() {
                    armed += 1;
                }
            }
        }
        info!(jobs = self.jobs.len(), armed, "Notification scheduler started");
        Ok(())
    }

    fn job(&self, kind: NotificationKind) -> AppResult<&Arc<ScheduledNotificationJob>> {
        self.jobs
            .get(&kind)
            .ok_or_else(|| AppError::not_found(format!("No job registered for '{kind}'")))
    }

    /// Whether `start` has run and the scheduler is ticking.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Re-arms one job from its row.
    ///
    /// Before `start` (or after `shutdown`) nothing would tick, so the job is
    /// left unarmed, `next_run` is not written and the state is
    /// [`ArmState::Stopped`].
    pub async fn reload(&self, kind: NotificationKind) -> AppResult<ArmState> {
        let job = self.job(kind)?;
        Ok(self.reload_job(kind, job).await)
    }

    /// Re-arms every job.
    pub async fn reload_all(&self) -> Vec<(NotificationKind, ArmState)> {
        let mut states = Vec::with_capacity(self.jobs.len());
        for kind in NotificationKind::ALL {
            if let Some(job) = self.jobs.get(&kind) {
                states.push((kind, self.reload_job(kind, job).await));
            }
        }
        states
    }

    async fn reload_job(
        &self,
        kind: NotificationKind,
        job: &Arc<ScheduledNotificationJob>,
    ) -> ArmState {
        if self.is_started() {
            return job.reload_schedule().await;
        }

        job.stop().await;
        info!(kind = %kind, "Scheduler not running, schedule left unarmed");
        ArmState::Stopped
    }

    /// Fires one job immediately, honouring the in-progress guard.
    pub async fn run_now(&self, kind: NotificationKind) -> AppResult<RunOutcome> {
        let job = self.job(kind)?;
        info!(kind = %kind, "Manual notification run requested");
        Ok(job.run_once().await)
    }

    /// Status of every job, in type order.
    pub async fn statuses(&self) -> Vec<JobStatus> {
        let mut statuses = Vec::with_capacity(self.jobs.len());
        for kind in NotificationKind::ALL {
            if let Some(job) = self.jobs.get(&kind) {
                statuses.push(job.status().await);
            }
        }
        statuses
    }

    /// Schedule rows as stored.
    pub async fn schedules(&self) -> AppResult<Vec<NotificationSchedule>> {
        self.schedules.list().await
    }

    /// Validates and stores a schedule edit, then re-arms that job.
    ///
    /// An invalid cron expression or timezone is rejected before anything is
    /// written.
    pub async fn update_schedule(
        &self,
        kind: NotificationKind,
        mut update: ScheduleUpdate,
    ) -> AppResult<(NotificationSchedule, ArmState)> {
        cron::validate(&update.schedule_cron)?;
        cron::validate_timezone(update.timezone.as_deref())?;
        update.schedule_cron = update.schedule_cron.split_whitespace().collect::<Vec<_>>().join(" ");
        update.timezone = update
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty());

        self.schedules.update(kind.as_str(), update).await?;
        let state = self.reload(kind).await?;
        let row = self
            .schedules
            .get(kind.as_str())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Schedule '{kind}' not found")))?;

        info!(kind = %kind, cron = %row.schedule_cron, enabled = row.is_enabled, "Schedule updated");
        Ok((row, state))
    }

    /// Disarms every job and stops the scheduler.
    pub async fn shutdown(&self) {
        self.started.store(false, Ordering::Release);
        for job in self.jobs.values() {
            job.stop().await;
        }
        let mut scheduler = self.scheduler.clone();
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Job scheduler did not shut down cleanly");
        }
        info!("Notification scheduler stopped");
    }
}
