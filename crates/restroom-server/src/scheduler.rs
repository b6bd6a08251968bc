//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! result-cache housekeeping job.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::Aggregator;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    aggregator: Arc<Aggregator>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_cache_housekeeping_job(&scheduler, aggregator).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Run the nearby-result cache's pending evictions at the top of every
/// minute (`0 * * * * *`) so expired entries are released without a read.
async fn register_cache_housekeeping_job(
    scheduler: &JobScheduler,
    aggregator: Arc<Aggregator>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let aggregator = Arc::clone(&aggregator);
        Box::pin(async move {
            let cache = aggregator.cache();
            let before = cache.entry_count();
            cache.run_pending_tasks().await;
            let remaining = cache.entry_count();
            if remaining < before {
                tracing::debug!(
                    removed = before - remaining,
                    remaining,
                    "scheduler: evicted stale cache entries"
                );
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
