use std::io::Write;

use crate::domain::transaction::Transaction;

/// Serializes the full collection into the persisted JSON array form.
pub fn encode_snapshot(txs: &[Transaction]) -> Result<String, serde_json::Error> {
    serde_json::to_string(txs)
}

#[derive(serde::Serialize)]
/// Internal CSV output row for transaction exports.
///
/// Headers written (in this order): `id,date,title,type,amount,description`.
/// Amounts are formatted to 2 decimal places as strings.
struct ExportRow<'a> {
    id: String,
    date: String,
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    amount: String,
    description: &'a str,
}

/// Writes transactions to a CSV writer in the order given.
///
/// # Errors
///
/// Returns a `csv::Error` if writing/serializing any row fails.
///
/// # Examples
///
/// ```
/// use finance_ledger::io::writer::write_csv;
///
/// let mut out = Vec::new();
/// write_csv(&mut out, &[]).unwrap();
///
/// let s = String::from_utf8(out).unwrap();
/// assert_eq!(s, "id,date,title,type,amount,description\n");
/// ```
pub fn write_csv<W: Write>(writer: W, txs: &[Transaction]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // written by hand so an empty export still carries the header
    wtr.write_record(["id", "date", "title", "type", "amount", "description"])?;
    for tx in txs {
        let row = ExportRow {
            id: tx.id.to_string(),
            date: tx.date.to_rfc3339(),
            title: &tx.title,
            kind: tx.kind.as_str(),
            amount: tx.amount.to_string_2dp(),
            description: tx.description.as_deref().unwrap_or(""),
        };
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}
