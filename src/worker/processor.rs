use crate::{
    common::{error::LedgerError, event::LedgerCommand, event::LedgerEvent},
    domain::ledger::Ledger,
    worker::handlers::{add, delete, update},
};

/// Routes a command to its handler. Each handler validates before it
/// mutates, so a failed command leaves the ledger exactly as it was.
pub fn process(ledger: &mut Ledger, command: LedgerCommand) -> Result<LedgerEvent, LedgerError> {
    let event = match command {
        LedgerCommand::Add {
            id,
            title,
            amount,
            kind,
            description,
            date,
        } => add::handle(
            ledger,
            id,
            &title,
            &amount,
            kind,
            description.as_deref(),
            date,
        )?,
        LedgerCommand::Update { id, patch } => update::handle(ledger, id, &patch)?,
        LedgerCommand::Delete { id } => delete::handle(ledger, id)?,
    };
    tracing::debug!(id = %event.id(), event = ?event, "applied ledger command");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::common::money::Money;
    use crate::domain::summary;
    use crate::domain::transaction::{TransactionId, TransactionPatch, TxType};

    fn add(title: &str, amount: &str, kind: TxType) -> LedgerCommand {
        LedgerCommand::Add {
            id: TransactionId::generate(),
            title: title.to_string(),
            amount: amount.to_string(),
            kind,
            description: None,
            date: Utc::now(),
        }
    }

    #[test]
    fn processes_a_sequence_of_commands() {
        let mut ledger = Ledger::new();

        let salary = process(&mut ledger, add("Salary", "1000", TxType::Income))
            .unwrap()
            .id();
        let rent = process(&mut ledger, add("Rent", "400", TxType::Expense))
            .unwrap()
            .id();
        process(
            &mut ledger,
            LedgerCommand::Update {
                id: salary,
                patch: TransactionPatch::new().amount("1200"),
            },
        )
        .unwrap();
        process(&mut ledger, LedgerCommand::Delete { id: rent }).unwrap();

        let totals = summary::totals(ledger.transactions());
        assert_eq!(totals.income, Money::new(120000));
        assert_eq!(totals.expenses, Money::ZERO);
        assert_eq!(totals.balance, Money::new(120000));
    }

    #[test]
    fn failed_command_is_reported() {
        let mut ledger = Ledger::new();

        let res = process(&mut ledger, add("Coffee", "abc", TxType::Expense));

        assert!(matches!(res, Err(LedgerError::Validation(_))));
        assert!(ledger.is_empty());
    }
}
