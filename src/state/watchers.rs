//! Registry of background confirmation watchers.
//!
//! A watcher is spawned per dispatched transaction and outlives the workflow
//! run that sent it. The registry only records that it exists; watchers report
//! through the status queue.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;
use tokio::task::JoinHandle;

use crate::models::address::TxHash;
use crate::models::intent::TransactionIntent;

/// How a confirmation watch ended.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumIs)]
pub enum WatchOutcome {
    Confirmed { block_number: u64 },
    Reverted { block_number: u64 },
    TimedOut,
    Failed(String),
}

#[derive(Debug)]
pub struct WatchedTransaction {
    pub tx_hash: TxHash,
    pub intent: TransactionIntent,
    pub started_at: DateTime<Utc>,
    pub handle: JoinHandle<WatchOutcome>,
}

/// Process-wide list of watchers. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct WatcherRegistry {
    watchers: Arc<Mutex<Vec<WatchedTransaction>>>,
}

impl WatcherRegistry {
    pub fn register(&self, watched: WatchedTransaction) {
        tracing::debug!("watching {} ({})", watched.tx_hash, watched.intent);
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(watched);
    }

    pub fn contains(&self, tx_hash: &TxHash) -> bool {
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|w| &w.tx_hash == tx_hash)
    }

    pub fn len(&self) -> usize {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// number of watchers still polling
    pub fn active(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|w| !w.handle.is_finished())
            .count()
    }

    /// remove and return the watcher for `tx_hash`, eg to await its outcome.
    pub fn take(&self, tx_hash: &TxHash) -> Option<WatchedTransaction> {
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        let index = watchers.iter().position(|w| &w.tx_hash == tx_hash)?;
        Some(watchers.remove(index))
    }

    /// drop records of watchers that have finished. their outcome was already
    /// written to the status queue.
    pub fn prune_finished(&self) {
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|w| !w.handle.is_finished());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_watcher_can_be_taken_and_awaited() {
        let registry = WatcherRegistry::default();
        let tx_hash = TxHash::new("0xabc");
        registry.register(WatchedTransaction {
            tx_hash: tx_hash.clone(),
            intent: TransactionIntent::Transfer,
            started_at: Utc::now(),
            handle: tokio::spawn(async { WatchOutcome::Confirmed { block_number: 7 } }),
        });

        assert!(registry.contains(&tx_hash));
        let watched = registry.take(&tx_hash).unwrap();
        assert_eq!(
            WatchOutcome::Confirmed { block_number: 7 },
            watched.handle.await.unwrap()
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn prune_keeps_running_watchers() {
        let registry = WatcherRegistry::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        registry.register(WatchedTransaction {
            tx_hash: TxHash::new("0x1"),
            intent: TransactionIntent::Shield,
            started_at: Utc::now(),
            handle: tokio::spawn(async move {
                let _ = rx.await;
                WatchOutcome::TimedOut
            }),
        });

        registry.prune_finished();
        assert_eq!(1, registry.active());
        drop(tx);
    }
}
