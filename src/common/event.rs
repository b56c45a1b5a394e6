use chrono::{DateTime, Utc};

use crate::domain::transaction::{Transaction, TransactionId, TransactionPatch, TxType};

/// A mutation request sent from the store to the processor.
///
/// `Add` carries raw user input and the timestamp to stamp on the new record;
/// the handler validates it before anything is inserted.
#[derive(Debug, Clone)]
pub enum LedgerCommand {
    Add {
        id: TransactionId,
        title: String,
        amount: String,
        kind: TxType,
        description: Option<String>,
        date: DateTime<Utc>,
    },
    Update {
        id: TransactionId,
        patch: TransactionPatch,
    },
    Delete {
        id: TransactionId,
    },
}

/// Emitted to listeners after a command has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Added(Transaction),
    Updated {
        before: Transaction,
        after: Transaction,
    },
    Deleted(Transaction),
}

impl LedgerEvent {
    pub fn id(&self) -> TransactionId {
        match self {
            LedgerEvent::Added(t) | LedgerEvent::Deleted(t) => t.id,
            LedgerEvent::Updated { after, .. } => after.id,
        }
    }

    /// The record the event is about: the new one for `Added`, the merged one
    /// for `Updated` and the removed one for `Deleted`.
    pub fn into_transaction(self) -> Transaction {
        match self {
            LedgerEvent::Added(t) | LedgerEvent::Deleted(t) => t,
            LedgerEvent::Updated { after, .. } => after,
        }
    }
}
