use crate::db::{VerificationRepository, WalletStorage};
use crate::error::WalletError;
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delete verification rows whose `expires_at` has passed. Users are left untouched.
pub async fn sweep_expired(storage: &WalletStorage) -> Result<u64, WalletError> {
    let mut conn = storage.acquire().await?;
    conn.delete_expired_verifications(Utc::now()).await
}

/// Run [`sweep_expired`] every `every` on a background task.
pub fn spawn(storage: WalletStorage, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Token Sweeper Started: Interval={:?}", every);
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep_expired(&storage).await {
                Ok(0) => debug!("no expired verification tokens"),
                Ok(n) => info!(removed = n, "purged expired verification tokens"),
                Err(e) => warn!(error = %e, "verification token sweep failed"),
            }
        }
    })
}
