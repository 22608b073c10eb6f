use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::models::revoked_token::RevokedToken;

pub const DEFAULT_CLEANUP_CRON: &str = "0 0 * * * *";

/// Removes revocation records whose tokens have expired on their own.
///
/// Returns the number of rows deleted.
pub async fn purge_expired_tokens(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let now_millis = Utc::now().timestamp_millis();
    let removed = RevokedToken::purge_expired(pool, now_millis).await?;

    tracing::info!(removed, "Expired revoked tokens purged");

    Ok(removed)
}

/// Schedules [`purge_expired_tokens`] on `cron` and starts the scheduler
pub async fn start_cleanup_job(pool: PgPool, cron: &str) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let pool = pool.clone();
        Box::pin(async move {
            if let Err(e) = purge_expired_tokens(&pool).await {
                tracing::error!(error = %e, "Revoked token cleanup failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron, "Revoked token cleanup job scheduled");

    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cron_is_valid() {
        let job = Job::new_async(DEFAULT_CLEANUP_CRON, |_id, _scheduler| Box::pin(async {}));
        assert!(job.is_ok());
    }

    #[test]
    fn test_invalid_cron_is_rejected() {
        let job = Job::new_async("not a cron expression", |_id, _scheduler| Box::pin(async {}));
        assert!(job.is_err());
    }
}
