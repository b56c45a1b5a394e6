use std::collections::HashSet;

use crate::domain::{
    summary::Totals,
    transaction::{Transaction, normalize_description},
};

/// Result of decoding a stored snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub transactions: Vec<Transaction>,
    /// Entries dropped because they were malformed or broke an invariant.
    pub discarded: usize,
}

/// Decodes a persisted snapshot without ever failing.
///
/// The blob must be a JSON array of transaction objects. A blob that is not
/// JSON, or not an array, decodes to an empty ledger. Inside a valid array,
/// each entry is checked on its own: entries with missing fields, an unknown
/// type, a blank title, an amount that is negative or out of range, an id
/// already seen, or an amount that would overflow the running totals are
/// dropped and the rest are kept in stored order.
///
/// # Examples
///
/// ```
/// use finance_ledger::io::reader::decode_snapshot;
///
/// let blob = r#"[
///   {"id":"0b6c8c63-2c1e-4a8e-9f59-1f1b5c8d2a01","title":"Salary","amount":1000,
///    "type":"income","date":"2024-05-01T09:30:00.000Z"},
///   {"title":"broken"}
/// ]"#;
/// let decoded = decode_snapshot(blob);
///
/// assert_eq!(decoded.transactions.len(), 1);
/// assert_eq!(decoded.discarded, 1);
/// assert!(decode_snapshot("not json").transactions.is_empty());
/// ```
pub fn decode_snapshot(blob: &str) -> Decoded {
    let entries = match serde_json::from_str::<serde_json::Value>(blob) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "stored snapshot is not an array, discarding");
            return Decoded::default();
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored snapshot is not valid json, discarding");
            return Decoded::default();
        }
    };

    let mut seen = HashSet::new();
    let mut totals = Totals::default();
    let mut decoded = Decoded::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match decode_entry(entry) {
            Ok(tx) if seen.contains(&tx.id) => {
                tracing::warn!(index, id = %tx.id, "duplicate transaction id in snapshot, discarding");
                decoded.discarded += 1;
            }
            Ok(tx) => match totals.checked_record(&tx) {
                Some(next) => {
                    totals = next;
                    seen.insert(tx.id);
                    decoded.transactions.push(tx);
                }
                None => {
                    tracing::warn!(index, id = %tx.id, "transaction overflows ledger totals, discarding");
                    decoded.discarded += 1;
                }
            },
            Err(reason) => {
                tracing::warn!(index, %reason, "malformed transaction in snapshot, discarding");
                decoded.discarded += 1;
            }
        }
    }
    decoded
}

fn decode_entry(entry: serde_json::Value) -> Result<Transaction, String> {
    let mut tx: Transaction = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    tx.validate().map_err(|e| e.to_string())?;
    tx.title = tx.title.trim().to_string();
    tx.description = normalize_description(tx.description.as_deref());
    Ok(tx)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
