//! Personal finance ledger: income/expense transactions, derived totals and
//! a JSON snapshot persisted after every change.
pub mod app;
pub mod common;
pub mod domain;
pub mod io;
pub mod settings;
pub mod worker;

pub use common::error::{LedgerError, PersistenceError, StorageError, ValidationError};
pub use common::event::LedgerEvent;
pub use common::money::Money;
pub use domain::summary::{Summary, Totals};
pub use domain::transaction::{Transaction, TransactionId, TransactionPatch, TxFilter, TxType};
pub use io::persistence::PersistenceAdapter;
pub use io::storage::{FileStore, KeyValueStore, MemoryStore};
pub use worker::store::{LedgerListener, LedgerStore, Phase, SubscriptionId};
