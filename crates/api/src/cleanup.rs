//! Periodic removal of expired sessions and verification codes.

use std::time::Duration;

use hms_db::repositories::{OtpRepo, SessionRepo};
use hms_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often expired rows are purged.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Background task that deletes expired refresh sessions and OTP codes.
pub struct CleanupScheduler {
    pool: DbPool,
}

impl CleanupScheduler {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run until `cancel` fires. The first sweep happens immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Cleanup scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Expired row cleanup failed");
                    }
                }
            }
        }
    }

    async fn sweep(&self) -> Result<(), sqlx::Error> {
        let sessions = SessionRepo::cleanup_expired(&self.pool).await?;
        let codes = OtpRepo::cleanup_expired(&self.pool).await?;
        if sessions > 0 || codes > 0 {
            tracing::info!(sessions, codes, "Purged expired sessions and codes");
        }
        Ok(())
    }
}
