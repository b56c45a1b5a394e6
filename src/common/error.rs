use crate::domain::transaction::TransactionId;
use crate::worker::store::Phase;

/// Input rejected before any state change; the caller should re-prompt.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("invalid amount: {0:?} is not a plain decimal number in range")]
    InvalidAmount(String),
    #[error("invalid amount: {0} is negative")]
    NegativeAmount(String),
    #[error("transaction id {0} is already in use")]
    DuplicateId(TransactionId),
    #[error("ledger totals would overflow")]
    TotalOverflow,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("transaction {0} not found")]
    NotFound(TransactionId),
    #[error("ledger is not ready (phase: {0})")]
    NotReady(Phase),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Load/save failure. Recovered inside the store, never returned from a
/// mutation.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("parse error: {0}")]
    Parse(String),
}
