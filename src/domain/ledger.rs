use crate::domain::transaction::{Transaction, TransactionId, TxFilter};

/// The in-memory transaction collection.
///
/// Records are kept newest-inserted first. Handlers in `worker::handlers` are
/// the only code that mutates it; outside the crate it is read-only.
///
/// ```compile_fail
/// let mut ledger = finance_ledger::domain::ledger::Ledger::new();
/// ledger.txs.clear();
/// ```
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    pub(crate) txs: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { txs: Vec::new() }
    }

    pub fn from_transactions(txs: Vec<Transaction>) -> Self {
        Self { txs }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.txs.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        self.txs.iter_mut().find(|t| t.id == id)
    }

    pub fn position(&self, id: TransactionId) -> Option<usize> {
        self.txs.iter().position(|t| t.id == id)
    }

    /// Returns matching transactions sorted newest first by date.
    ///
    /// The sort is stable, so entries sharing a timestamp keep collection
    /// order (most recently inserted first).
    pub fn list(&self, filter: TxFilter) -> Vec<Transaction> {
        let mut out: Vec<Transaction> = self
            .txs
            .iter()
            .filter(|t| filter.matches(t.kind))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out
    }
}
