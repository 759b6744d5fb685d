//! Pending-transaction queue.
//!
//! Maps a transaction ID to the [`Entry`] created in the pre-transaction
//! phase. One lock covers reads and writes. A consumed ID stays reserved so
//! it can never be registered again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use consent_crypto::Key32;

use crate::errors::QueueError;
use crate::types::Entry;

#[derive(Debug, Clone)]
enum Slot {
    Pending(Entry),
    Consumed,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionQueue {
    entries: Arc<RwLock<HashMap<Key32, Slot>>>,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under its transaction ID. Fails if the ID was ever seen.
    pub async fn add(&self, entry: Entry) -> Result<(), QueueError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.transaction_id) {
            return Err(QueueError::AlreadyExists(entry.transaction_id.to_hex()));
        }
        entries.insert(entry.transaction_id, Slot::Pending(entry));
        Ok(())
    }

    /// Look up a pending entry without changing it.
    pub async fn get(&self, transaction_id: &Key32) -> Option<Entry> {
        let entries = self.entries.read().await;
        match entries.get(transaction_id) {
            Some(Slot::Pending(entry)) => Some(entry.clone()),
            Some(Slot::Consumed) | None => None,
        }
    }

    /// Atomically take a pending entry, leaving the ID reserved.
    pub async fn consume(&self, transaction_id: &Key32) -> Result<Entry, QueueError> {
        let mut entries = self.entries.write().await;
        let slot = entries
            .get_mut(transaction_id)
            .ok_or_else(|| QueueError::NotFound(transaction_id.to_hex()))?;
        match std::mem::replace(slot, Slot::Consumed) {
            Slot::Pending(entry) => Ok(entry),
            Slot::Consumed => Err(QueueError::AlreadyConsumed(transaction_id.to_hex())),
        }
    }

    /// Number of pending entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
