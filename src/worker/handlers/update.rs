use crate::{
    common::{
        error::{LedgerError, ValidationError},
        event::LedgerEvent,
        money::Money,
    },
    domain::{
        ledger::Ledger,
        summary,
        transaction::{TransactionId, TransactionPatch, normalize_description, normalize_title},
    },
};

pub fn handle(
    ledger: &mut Ledger,
    id: TransactionId,
    patch: &TransactionPatch,
) -> Result<LedgerEvent, LedgerError> {
    let before = match ledger.get(id) {
        Some(t) => t.clone(),
        None => return Err(LedgerError::NotFound(id)),
    };

    // build the merged record on the side so a bad field leaves the ledger untouched
    let mut after = before.clone();
    if let Some(title) = &patch.title {
        after.title = normalize_title(title)?;
    }
    if let Some(amount) = &patch.amount {
        after.amount = Money::parse_amount(amount)?;
    }
    if let Some(kind) = patch.kind {
        after.kind = kind;
    }
    if let Some(description) = &patch.description {
        after.description = normalize_description(description.as_deref());
    }
    if let Some(date) = patch.date {
        after.date = date;
    }

    let merged = ledger
        .transactions()
        .iter()
        .map(|t| if t.id == id { &after } else { t });
    summary::checked_totals(merged).ok_or(ValidationError::TotalOverflow)?;

    if let Some(t) = ledger.get_mut(id) {
        *t = after.clone();
    }

    Ok(LedgerEvent::Updated { before, after })
}
