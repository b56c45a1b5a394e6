use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{error::ValidationError, money::Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Income,
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "income",
            TxType::Expense => "expense",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TxType::Income),
            "expense" => Ok(TxType::Expense),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Which transactions a listing should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TxFilter {
    pub fn matches(&self, kind: TxType) -> bool {
        match self {
            TxFilter::All => true,
            TxFilter::Income => kind == TxType::Income,
            TxFilter::Expense => kind == TxType::Expense,
        }
    }
}

impl FromStr for TxFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TxFilter::All),
            "income" => Ok(TxFilter::Income),
            "expense" => Ok(TxFilter::Expense),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// One ledger entry, exactly as it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub title: String,
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: TxType,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Checks the invariants every stored record must hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.amount.is_negative() {
            return Err(ValidationError::NegativeAmount(self.amount.to_string()));
        }
        if !self.amount.in_range() {
            return Err(ValidationError::InvalidAmount(self.amount.to_string()));
        }
        Ok(())
    }
}

/// Partial update for an existing transaction. Fields left as `None` keep
/// their current value.
///
/// `amount` is raw user text and is validated when the patch is applied.
/// `description` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub title: Option<String>,
    pub amount: Option<String>,
    pub kind: Option<TxType>,
    pub description: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn kind(mut self, kind: TxType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Trims a title and rejects it when nothing is left.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Empty and whitespace-only descriptions are stored as absent.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
