use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::check_engine::CheckEngine;
use crate::models::Listing;
use crate::store::WatchStore;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulerStats {
    pub completed_runs: u64,
    pub failed_runs: u64,
    /// Runs refused because another pass was still going
    pub skipped_runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_matches: usize,
    pub last_run_time_ms: u64,
    pub last_error: Option<String>,
    pub uptime_seconds: u64,
}

/// Runs a check pass from the watch store on a fixed interval.
pub struct CheckScheduler {
    scheduler: JobScheduler,
    engine: Arc<CheckEngine>,
    store: Arc<WatchStore>,
    interval: Duration,
    stats: Arc<RwLock<SchedulerStats>>,
    job_id: Option<Uuid>,
    start_time: DateTime<Utc>,
}

impl CheckScheduler {
    pub async fn new(
        engine: Arc<CheckEngine>,
        store: Arc<WatchStore>,
        interval: Duration,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            engine,
            store,
            interval,
            stats: Arc::new(RwLock::new(SchedulerStats::default())),
            job_id: None,
            start_time: Utc::now(),
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.job_id.is_some() {
            return Err(AppError::Scheduler("Scheduler already started".into()));
        }

        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);

        let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
            let engine = Arc::clone(&engine);
            let store = Arc::clone(&store);
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                // Outcome is recorded in the stats
                let _ = Self::execute_check(&engine, &store, &stats).await;
            })
        })?;

        self.job_id = Some(self.scheduler.add(job).await?);
        self.scheduler.start().await?;
        tracing::info!(
            "Check scheduler started, running every {} minutes",
            self.interval.as_secs() / 60
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(job_id) = self.job_id.take() {
            self.scheduler.remove(&job_id).await?;
        }
        self.scheduler.shutdown().await?;
        tracing::info!("Check scheduler shutdown");
        Ok(())
    }

    /// Runs a pass immediately, outside the schedule.
    pub async fn run_now(&self) -> Result<Vec<Listing>> {
        Self::execute_check(&self.engine, &self.store, &self.stats).await
    }

    pub async fn stats(&self) -> SchedulerStats {
        let mut stats = self.stats.read().await.clone();
        let uptime = Utc::now().signed_duration_since(self.start_time);
        stats.uptime_seconds = uptime.num_seconds().max(0) as u64;
        stats
    }

    async fn execute_check(
        engine: &CheckEngine,
        store: &WatchStore,
        stats: &RwLock<SchedulerStats>,
    ) -> Result<Vec<Listing>> {
        let start_time = Instant::now();
        let result = engine.run_from_store(store).await;
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        let mut stats = stats.write().await;
        match &result {
            Ok(listings) => {
                stats.completed_runs += 1;
                stats.last_run = Some(Utc::now());
                stats.last_matches = listings.len();
                stats.last_run_time_ms = elapsed_ms;
                stats.last_error = None;
            }
            Err(AppError::CheckInProgress) => {
                stats.skipped_runs += 1;
                tracing::info!("Scheduled check skipped, previous one still running");
            }
            Err(e) => {
                stats.failed_runs += 1;
                stats.last_run = Some(Utc::now());
                stats.last_error = Some(e.to_string());
                tracing::error!("Scheduled check failed: {}", e);
            }
        }

        result
    }
}
