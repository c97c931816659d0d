//! Schedule registry: one independent cron timer per backup kind.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{BackupError, Result};
use crate::models::schedule::{BackupKind, ScheduleStatus};
use crate::state::AppState;

pub struct ScheduleRegistry {
    scheduler: Mutex<JobScheduler>,
    state: Arc<AppState>,
}

impl ScheduleRegistry {
    pub async fn new(state: Arc<AppState>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| BackupError::Schedule(e.to_string()))?;
        Ok(ScheduleRegistry {
            scheduler: Mutex::new(scheduler),
            state,
        })
    }

    /// Registers the diff schedule plus the optional full and schema
    /// schedules. An expression that fails to parse aborts startup here,
    /// before any timer has fired.
    pub async fn init_schedules(&self) -> Result<()> {
        let config = self.state.config.clone();
        self.register(BackupKind::Diff, &config.diff_schedule).await?;
        if let Some(expression) = &config.full_schedule {
            self.register(BackupKind::Full, expression).await?;
        }
        if let Some(expression) = &config.schema_schedule {
            self.register(BackupKind::Schema, expression).await?;
        }
        Ok(())
    }

    async fn register(&self, kind: BackupKind, expression: &str) -> Result<()> {
        let state = self.state.clone();
        let job = Job::new_async(expression, move |_uuid, _lock| {
            let state = state.clone();
            Box::pin(async move {
                run_scheduled(state, kind).await;
            })
        })
        .map_err(|e| {
            BackupError::Schedule(format!("{} schedule '{}' is invalid: {}", kind, expression, e))
        })?;

        self.scheduler
            .lock()
            .await
            .add(job)
            .await
            .map_err(|e| BackupError::Schedule(e.to_string()))?;

        self.state.schedules.lock().await.insert(
            kind,
            ScheduleStatus {
                kind,
                schedule: expression.to_string(),
                last: None,
            },
        );

        tracing::info!(kind = %kind, cron = %expression, "Schedule registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| BackupError::Schedule(e.to_string()))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| BackupError::Schedule(e.to_string()))
    }
}

async fn run_scheduled(state: Arc<AppState>, kind: BackupKind) {
    {
        let mut running = state.running.lock().await;
        if running.contains(&kind) {
            tracing::warn!(kind = %kind, "Skipping scheduled run: previous run still in progress");
            return;
        }
        running.insert(kind);
    }

    tracing::info!(kind = %kind, "Backup run started");
    let result = match kind {
        BackupKind::Diff => state.connector.diff().await,
        BackupKind::Full => state.connector.full().await.map(|_| ()),
        BackupKind::Schema => state.connector.schema().await.map(|_| ()),
    };

    match result {
        Ok(()) => {
            let now = Utc::now();
            if let Some(entry) = state.schedules.lock().await.get_mut(&kind) {
                entry.last = Some(now);
            }
            tracing::info!(kind = %kind, "Backup run completed");
        }
        Err(e) => {
            tracing::error!(kind = %kind, error = %e, "Backup run failed");
        }
    }

    state.running.lock().await.remove(&kind);
}
