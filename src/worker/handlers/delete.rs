use crate::{
    common::{error::LedgerError, event::LedgerEvent},
    domain::{ledger::Ledger, transaction::TransactionId},
};

/// Removes a transaction. An unknown id is reported as `NotFound` every
/// time, so repeating a delete never changes state.
pub fn handle(ledger: &mut Ledger, id: TransactionId) -> Result<LedgerEvent, LedgerError> {
    let idx = ledger.position(id).ok_or(LedgerError::NotFound(id))?;
    let removed = ledger.txs.remove(idx);
    Ok(LedgerEvent::Deleted(removed))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::common::money::Money;
    use crate::domain::transaction::{Transaction, TxType};

    fn tx(title: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            title: title.to_string(),
            amount: Money::new(1000),
            kind: TxType::Expense,
            date: Utc::now(),
            description: None,
        }
    }

    #[test]
    fn test_delete_removes_only_target() {
        let keep = tx("keep");
        let gone = tx("gone");
        let gone_id = gone.id;
        let mut ledger = Ledger::from_transactions(vec![keep.clone(), gone]);

        let event = handle(&mut ledger, gone_id).unwrap();

        assert!(matches!(event, LedgerEvent::Deleted(ref t) if t.id == gone_id));
        assert_eq!(ledger.transactions(), &[keep]);
    }

    #[test]
    fn test_delete_twice_is_idempotent() {
        let target = tx("coffee");
        let id = target.id;
        let mut ledger = Ledger::from_transactions(vec![tx("other"), target]);

        handle(&mut ledger, id).unwrap();
        let after_first = ledger.transactions().to_vec();

        let err = handle(&mut ledger, id).unwrap_err();

        assert_eq!(err, LedgerError::NotFound(id));
        assert_eq!(ledger.transactions(), after_first.as_slice());
    }
}
