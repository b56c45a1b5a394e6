use tokio::sync::Mutex;

use crate::{
    common::error::PersistenceError,
    domain::transaction::Transaction,
    io::{reader, storage::KeyValueStore, writer},
};

pub const DEFAULT_SLOT: &str = "transactions";

/// What happened to a snapshot handed to [`PersistenceAdapter::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// A newer snapshot had already been written; this one was dropped.
    Superseded,
}

/// Loads and saves the whole ledger as one JSON blob in a named slot.
///
/// Snapshots are tagged with a sequence number by the caller, taken under
/// the same lock as the mutation they follow. Saves are serialized here and
/// a snapshot older than the last one written is skipped, so when saves
/// overlap the most recent state always ends up in the slot.
#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    store: S,
    slot: String,
    last_written: Mutex<u64>,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self::with_slot(store, DEFAULT_SLOT)
    }

    pub fn with_slot(store: S, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
            last_written: Mutex::new(0),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the stored snapshot. Never fails: a missing, unreadable or
    /// malformed slot yields an empty collection.
    pub async fn load(&self) -> Vec<Transaction> {
        let blob = match self.store.get(&self.slot).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                tracing::info!(slot = %self.slot, "no stored snapshot, starting empty");
                return Vec::new();
            }
            Err(err) => {
                tracing::error!(slot = %self.slot, error = %err, "failed to read snapshot, starting empty");
                return Vec::new();
            }
        };

        let decoded = reader::decode_snapshot(&blob);
        if decoded.discarded > 0 {
            tracing::warn!(
                slot = %self.slot,
                discarded = decoded.discarded,
                "discarded malformed entries while loading"
            );
        }
        tracing::info!(slot = %self.slot, count = decoded.transactions.len(), "loaded snapshot");
        decoded.transactions
    }

    /// Overwrites the slot with `snapshot` unless a newer one (higher `seq`)
    /// has already been written.
    pub async fn save(
        &self,
        seq: u64,
        snapshot: &[Transaction],
    ) -> Result<SaveOutcome, PersistenceError> {
        let mut last_written = self.last_written.lock().await;
        if seq <= *last_written {
            tracing::debug!(seq, last = *last_written, "snapshot superseded, skipping write");
            return Ok(SaveOutcome::Superseded);
        }

        let blob = writer::encode_snapshot(snapshot)?;
        self.store.set(&self.slot, blob).await?;
        *last_written = seq;
        tracing::debug!(seq, count = snapshot.len(), slot = %self.slot, "snapshot written");
        Ok(SaveOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::common::error::StorageError;
    use crate::common::money::Money;
    use crate::domain::transaction::{TransactionId, TxType};
    use crate::io::storage::MemoryStore;

    fn tx(title: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            title: title.to_string(),
            amount: Money::new(2500),
            kind: TxType::Expense,
            date: Utc::now(),
            description: None,
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let adapter = PersistenceAdapter::new(MemoryStore::new());
        let txs = vec![tx("a"), tx("b")];

        assert_eq!(adapter.save(1, &txs).await.unwrap(), SaveOutcome::Written);

        assert_eq!(adapter.load().await, txs);
    }

    #[tokio::test]
    async fn load_missing_slot_is_empty() {
        let adapter = PersistenceAdapter::new(MemoryStore::new());
        assert!(adapter.load().await.is_empty());
    }

    #[tokio::test]
    async fn load_malformed_slot_is_empty() {
        let adapter =
            PersistenceAdapter::new(MemoryStore::with_slot(DEFAULT_SLOT, "{definitely not"));
        assert!(adapter.load().await.is_empty());
    }

    #[tokio::test]
    async fn load_read_error_is_empty() {
        let adapter = PersistenceAdapter::new(BrokenStore);
        assert!(adapter.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_error_is_returned() {
        let adapter = PersistenceAdapter::new(BrokenStore);
        let res = adapter.save(1, &[tx("a")]).await;
        assert!(matches!(res, Err(PersistenceError::Storage(_))));
    }

    #[tokio::test]
    async fn older_snapshot_never_overwrites_newer() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(Arc::clone(&store));
        let newer = vec![tx("newer"), tx("older")];
        let older = vec![tx("older")];

        assert_eq!(adapter.save(2, &newer).await.unwrap(), SaveOutcome::Written);
        assert_eq!(
            adapter.save(1, &older).await.unwrap(),
            SaveOutcome::Superseded
        );

        assert_eq!(adapter.load().await, newer);
    }

    #[tokio::test]
    async fn writes_to_configured_slot() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::with_slot(Arc::clone(&store), "ledger");
        let txs = vec![tx("a")];

        adapter.save(3, &txs).await.unwrap();

        let blob = store.get("ledger").await.unwrap().unwrap();
        assert!(blob.contains("\"title\":\"a\""));
        assert_eq!(adapter.slot(), "ledger");
    }
}
