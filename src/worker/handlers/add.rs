use chrono::{DateTime, Utc};

use crate::{
    common::{
        error::{LedgerError, ValidationError},
        event::LedgerEvent,
        money::Money,
    },
    domain::{
        ledger::Ledger,
        summary,
        transaction::{Transaction, TransactionId, TxType, normalize_description, normalize_title},
    },
};

pub fn handle(
    ledger: &mut Ledger,
    id: TransactionId,
    title: &str,
    amount: &str,
    kind: TxType,
    description: Option<&str>,
    date: DateTime<Utc>,
) -> Result<LedgerEvent, LedgerError> {
    // validate everything before touching the ledger
    let title = normalize_title(title)?;
    let amount = Money::parse_amount(amount)?;

    // ids are freshly generated v4 uuids; a clash means a caller reused one
    if ledger.contains(id) {
        return Err(ValidationError::DuplicateId(id).into());
    }

    let tx = Transaction {
        id,
        title,
        amount,
        kind,
        date,
        description: normalize_description(description),
    };
    summary::checked_totals(ledger.transactions())
        .and_then(|totals| totals.checked_record(&tx))
        .ok_or(ValidationError::TotalOverflow)?;

    ledger.txs.insert(0, tx.clone());
    Ok(LedgerEvent::Added(tx))
}
