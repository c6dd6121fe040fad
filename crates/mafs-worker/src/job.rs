//! A notification type's timer and its firing logic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use mafs_database::store::ScheduleStore;
use mafs_entity::schedule::NotificationKind;
use mafs_service::{NotificationSummary, NotificationTask};

use crate::cron;
use crate::error::JobExecutionError;

/// Result of the most recent `reload_schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArmState {
    /// Timer armed.
    Armed {
        cron: String,
        timezone: String,
        next_run: Option<DateTime<Utc>>,
    },
    /// The row exists but is disabled.
    Disabled,
    /// No row for this type.
    Missing,
    /// The row's expression could not be parsed.
    InvalidCron { error: String },
    /// The schedule store failed.
    Unavailable { error: String },
    /// Never armed, or stopped.
    Stopped,
}

impl ArmState {
    /// Whether a timer is armed.
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// Result of one firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A previous firing was still running.
    Skipped,
    /// The notification service ran.
    Completed { summary: NotificationSummary },
    /// The firing failed; the job stays armed.
    Failed { error: String },
}

/// When the job last fired and how it went.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRun {
    pub at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

/// Snapshot returned by [`ScheduledNotificationJob::status`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub notification_type: NotificationKind,
    pub state: ArmState,
    pub running: bool,
    pub last_run: Option<LastRun>,
}

#[derive(Debug, Clone)]
struct Armed {
    job_id: Uuid,
}

/// Clears the in-progress flag on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One notification type's timer.
///
/// The in-progress flag is per process; several server instances sharing a
/// database will each fire.
pub struct ScheduledNotificationJob {
    kind: NotificationKind,
    schedules: Arc<dyn ScheduleStore>,
    task: Arc<dyn NotificationTask>,
    scheduler: JobScheduler,
    running: AtomicBool,
    armed: Mutex<Option<Armed>>,
    state: Mutex<ArmState>,
    last_run: Mutex<Option<LastRun>>,
}

impl std::fmt::Debug for ScheduledNotificationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledNotificationJob")
            .field("kind", &self.kind)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

impl ScheduledNotificationJob {
    /// Creates an unarmed job for `task`'s notification type.
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        task: Arc<dyn NotificationTask>,
        scheduler: JobScheduler,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind: task.kind(),
            schedules,
            task,
            scheduler,
            running: AtomicBool::new(false),
            armed: Mutex::new(None),
            state: Mutex::new(ArmState::Stopped),
            last_run: Mutex::new(None),
        })
    }

    /// The notification type this job fires.
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Arms the timer on first start.
    pub async fn initialize(self: &Arc<Self>) -> ArmState {
        self.reload_schedule().await
    }

    /// Re-reads the schedule row and re-arms the timer. Never fails; the
    /// returned state says what happened.
    pub async fn reload_schedule(self: &Arc<Self>) -> ArmState {
        let mut armed = self.armed.lock().await;
        self.disarm(&mut armed).await;

        let state = self.arm(&mut armed).await;
        match &state {
            ArmState::Armed { cron, timezone, next_run } => info!(
                kind = %self.kind,
                cron = %cron,
                timezone = %timezone,
                next_run = ?next_run,
                "Notification job armed"
            ),
            ArmState::Disabled => info!(kind = %self.kind, "Notification schedule disabled"),
            ArmState::Missing => warn!(kind = %self.kind, "Notification schedule row missing"),
            ArmState::InvalidCron { error } => {
                error!(kind = %self.kind, error = %error, "Invalid cron expression, job not armed")
            }
            ArmState::Unavailable { error } => {
                error!(kind = %self.kind, error = %error, "Could not load notification schedule")
            }
            ArmState::Stopped => {}
        }

        *self.state.lock().await = state.clone();
        state
    }

    async fn arm(self: &Arc<Self>, armed: &mut Option<Armed>) -> ArmState {
        let row = match self.schedules.get(self.kind.as_str()).await {
            Ok(Some(row)) => row,
            Ok(None) => return ArmState::Missing,
            Err(e) => return ArmState::Unavailable { error: e.message },
        };
        if !row.is_enabled {
            if let Err(e) = self.schedules.set_next_run(self.kind.as_str(), None).await {
                warn!(kind = %self.kind, error = %e, "Failed to clear next_run");
            }
            return ArmState::Disabled;
        }

        let expr = cron::normalize(&row.schedule_cron);
        let tz = cron::resolve_timezone(row.timezone.as_deref());

        let weak: Weak<Self> = Arc::downgrade(self);
        let job = Job::new_async_tz(expr.as_str(), tz, move |_id, _scheduler| {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(job) = weak.upgrade() {
                    job.run_once().await;
                }
            })
        });
        let job = match job {
            Ok(job) => job,
            Err(e) => {
                return ArmState::InvalidCron {
                    error: format!("'{}': {e}", row.schedule_cron),
                };
            }
        };

        let job_id = match self.scheduler.add(job).await {
            Ok(id) => id,
            Err(e) => {
                return ArmState::Unavailable {
                    error: format!("Scheduler rejected job: {e}"),
                };
            }
        };
        *armed = Some(Armed { job_id });

        let next_run = self.next_tick(job_id).await;
        if let Err(e) = self.schedules.set_next_run(self.kind.as_str(), next_run).await {
            warn!(kind = %self.kind, error = %e, "Failed to persist next_run");
        }

        ArmState::Armed {
            cron: expr,
            timezone: tz.name().to_string(),
            next_run,
        }
    }

    async fn disarm(&self, armed: &mut Option<Armed>) {
        if let Some(previous) = armed.take() {
            if let Err(e) = self.scheduler.remove(&previous.job_id).await {
                warn!(kind = %self.kind, error = %e, "Failed to remove previous timer");
            }
            debug!(kind = %self.kind, "Notification job disarmed");
        }
    }

    async fn next_tick(&self, job_id: Uuid) -> Option<DateTime<Utc>> {
        let mut scheduler = self.scheduler.clone();
        match scheduler.next_tick_for_job(job_id).await {
            Ok(next) => next,
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "Could not compute next run");
                None
            }
        }
    }

    /// Fires the notification once, unless a previous firing is still
    /// running.
    pub async fn run_once(&self) -> RunOutcome {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            info!(kind = %self.kind, "Previous run still in progress, skipping");
            return RunOutcome::Skipped;
        };

        let started = Utc::now();
        let outcome = match self.execute(started).await {
            Ok(summary) => RunOutcome::Completed { summary },
            Err(e) => {
                error!(kind = %self.kind, error = %e, "Notification job failed");
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let armed = self.armed.lock().await.as_ref().map(|a| a.job_id);
        if let Some(job_id) = armed {
            let next_run = self.next_tick(job_id).await;
            if let Err(e) = self.schedules.set_next_run(self.kind.as_str(), next_run).await {
                warn!(kind = %self.kind, error = %e, "Failed to persist next_run");
            }
        }

        *self.last_run.lock().await = Some(LastRun {
            at: started,
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn execute(&self, started: DateTime<Utc>) -> Result<NotificationSummary, JobExecutionError> {
        self.schedules
            .mark_started(self.kind.as_str(), started)
            .await
            .map_err(JobExecutionError::Store)?;

        self.task.run().await.map_err(JobExecutionError::Task)
    }

    /// Disarms the timer.
    pub async fn stop(&self) {
        let mut armed = self.armed.lock().await;
        self.disarm(&mut armed).await;
        *self.state.lock().await = ArmState::Stopped;
    }

    /// Current state of the job.
    pub async fn status(&self) -> JobStatus {
        JobStatus {
            notification_type: self.kind,
            state: self.state.lock().await.clone(),
            running: self.running.load(Ordering::Acquire),
            last_run: self.last_run.lock().await.clone(),
        }
    }

    /// Whether a firing is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::Timelike;
    use tokio::sync::Notify;

    use mafs_core::error::AppError;
    use mafs_core::result::AppResult;
    use mafs_database::MemoryStore;
    use mafs_entity::schedule::NotificationSchedule;

    use super::*;

    struct CountingTask {
        calls: AtomicUsize,
        fail: bool,
        started: Notify,
        release: Option<Notify>,
    }

    impl CountingTask {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                started: Notify::new(),
                release: None,
            }
        }
    }

    #[async_trait]
    impl NotificationTask for CountingTask {
        fn kind(&self) -> NotificationKind {
            NotificationKind::OldOpenTickets
        }

        async fn run(&self) -> AppResult<NotificationSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            if let Some(release) = &self.release {
                release.notified().await;
            }
            if self.fail {
                return Err(AppError::internal("boom"));
            }
            Ok(NotificationSummary::new(NotificationKind::OldOpenTickets))
        }
    }

    fn row(cron: &str, enabled: bool) -> NotificationSchedule {
        NotificationSchedule {
            notification_type: "old_open_tickets".into(),
            schedule_cron: cron.into(),
            timezone: None,
            is_enabled: enabled,
            last_run: None,
            next_run: None,
            updated_at: Utc::now(),
        }
    }

    async fn job_with(
        memory: &Arc<MemoryStore>,
        task: Arc<CountingTask>,
    ) -> Arc<ScheduledNotificationJob> {
        let scheduler = JobScheduler::new().await.unwrap();
        let store: Arc<dyn ScheduleStore> = memory.clone();
        ScheduledNotificationJob::new(store, task, scheduler)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_disabled_row_arms_nothing() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", false)).await;
        let job = job_with(&memory, Arc::new(CountingTask::new())).await;

        assert_eq!(job.initialize().await, ArmState::Disabled);
        assert!(job.armed.lock().await.is_none());
        assert!(!job.status().await.state.is_armed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_row_arms_nothing() {
        let memory = Arc::new(MemoryStore::new());
        let job = job_with(&memory, Arc::new(CountingTask::new())).await;

        assert_eq!(job.reload_schedule().await, ArmState::Missing);
        assert!(job.armed.lock().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_invalid_cron_leaves_no_timer() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", true)).await;
        let job = job_with(&memory, Arc::new(CountingTask::new())).await;
        assert!(job.initialize().await.is_armed());

        memory.put_schedule(row("banana", true)).await;
        let state = job.reload_schedule().await;
        assert!(matches!(state, ArmState::InvalidCron { .. }));
        assert!(job.armed.lock().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_daily_nine_is_armed() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", true)).await;
        let job = job_with(&memory, Arc::new(CountingTask::new())).await;

        match job.initialize().await {
            ArmState::Armed {
                cron,
                timezone,
                next_run,
            } => {
                assert_eq!(cron, "0 0 9 * * *");
                assert_eq!(timezone, "UTC");
                let next = next_run.expect("armed job has a next run");
                assert_eq!((next.hour(), next.minute(), next.second()), (9, 0, 0));
            }
            other => panic!("expected armed, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_firing_while_running_is_skipped() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", true)).await;
        let task = Arc::new(CountingTask {
            release: Some(Notify::new()),
            ..CountingTask::new()
        });
        let job = job_with(&memory, Arc::clone(&task)).await;

        let first = tokio::spawn({
            let job = Arc::clone(&job);
            async move { job.run_once().await }
        });
        task.started.notified().await;
        assert!(job.is_running());

        assert_eq!(job.run_once().await, RunOutcome::Skipped);
        assert_eq!(task.calls.load(Ordering::SeqCst), 1);

        if let Some(release) = &task.release {
            release.notify_one();
        }
        assert!(matches!(first.await.unwrap(), RunOutcome::Completed { .. }));
        assert!(!job.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_is_swallowed_and_flag_cleared() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", true)).await;
        let task = Arc::new(CountingTask {
            fail: true,
            ..CountingTask::new()
        });
        let job = job_with(&memory, Arc::clone(&task)).await;
        job.initialize().await;

        assert!(matches!(job.run_once().await, RunOutcome::Failed { .. }));
        assert!(matches!(job.run_once().await, RunOutcome::Failed { .. }));
        assert_eq!(task.calls.load(Ordering::SeqCst), 2);
        assert!(job.status().await.state.is_armed());

        let stored = memory.get("old_open_tickets").await.unwrap().unwrap();
        assert!(stored.last_run.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_disarms() {
        let memory = Arc::new(MemoryStore::new());
        memory.put_schedule(row("0 9 * * *", true)).await;
        let job = job_with(&memory, Arc::new(CountingTask::new())).await;
        job.initialize().await;

        job.stop().await;
        assert!(job.armed.lock().await.is_none());
        assert_eq!(job.status().await.state, ArmState::Stopped);
    }
}
