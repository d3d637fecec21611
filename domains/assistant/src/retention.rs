//! Receipt retention
//!
//! Receipt claims only need to outlive the provider's redelivery window.
//! A background task deletes claims older than the retention period on a
//! fixed interval, starting with one pass at startup.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::repository::ReceiptRepository;

/// How often expired claims are deleted
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Handle to the running pruner
pub struct ReceiptPruner {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ReceiptPruner {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Receipt pruner terminated abnormally");
        }
    }
}

pub fn spawn_receipt_pruner(
    receipts: Arc<dyn ReceiptRepository>,
    retention: Duration,
    every: Duration,
) -> ReceiptPruner {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    prune_once(receipts.as_ref(), retention).await;
                }
            }
        }
    });

    tracing::info!(retention_secs = retention.as_secs(), "Receipt pruner started");

    ReceiptPruner {
        shutdown_tx,
        handle,
    }
}

/// One pruning pass; `None` when the store failed
pub async fn prune_once(receipts: &dyn ReceiptRepository, retention: Duration) -> Option<u64> {
    let Ok(retention) = chrono::Duration::from_std(retention) else {
        tracing::warn!("Receipt retention out of range; skipping prune");
        return None;
    };

    match receipts.prune_before(Utc::now() - retention).await {
        Ok(removed) => {
            if removed > 0 {
                tracing::info!(removed, "Pruned expired inbound receipts");
            }
            Some(removed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Receipt prune failed; retrying next interval");
            None
        }
    }
}
