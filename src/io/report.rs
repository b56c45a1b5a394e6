use std::fmt::Write;

use crate::domain::{summary::Summary, transaction::TxType};

const DESCRIPTION_WIDTH: usize = 50;
const NO_DESCRIPTION: &str = "No description";

/// Renders a plain-text financial summary: totals first, then one row per
/// transaction in the order the summary holds them.
pub fn render_text(summary: &Summary) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_report(&mut out, summary);
    out
}

fn write_report(out: &mut String, summary: &Summary) -> std::fmt::Result {
    writeln!(out, "Financial summary")?;
    writeln!(out, "=================")?;
    writeln!(out, "Income:   {:>12}", summary.income.to_string_2dp())?;
    writeln!(out, "Expenses: {:>12}", summary.expenses.to_string_2dp())?;
    writeln!(out, "Balance:  {:>12}", summary.balance.to_string_2dp())?;
    writeln!(out)?;

    writeln!(out, "Transactions ({})", summary.transactions.len())?;
    if summary.transactions.is_empty() {
        writeln!(out, "  (none)")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<10}  {:<24}  {:<50}  {:<7}  {:>12}",
        "Date", "Title", "Description", "Type", "Amount"
    )?;
    for tx in &summary.transactions {
        writeln!(
            out,
            "{:<10}  {:<24}  {:<50}  {:<7}  {:>12}",
            tx.date.format("%d/%m/%Y").to_string(),
            tx.title,
            truncate(tx.description.as_deref(), DESCRIPTION_WIDTH),
            type_label(tx.kind),
            tx.amount.to_string_2dp()
        )?;
    }
    Ok(())
}

fn type_label(kind: TxType) -> &'static str {
    match kind {
        TxType::Income => "Income",
        TxType::Expense => "Expense",
    }
}

/// Shortens text to `max` characters, ending in "..." when cut.
pub fn truncate(text: Option<&str>, max: usize) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return NO_DESCRIPTION.to_string();
    };
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::common::money::Money;
    use crate::domain::summary::{self, Summary};
    use crate::domain::transaction::{Transaction, TransactionId};

    #[test]
    fn truncates_long_descriptions() {
        assert_eq!(truncate(None, 50), "No description");
        assert_eq!(truncate(Some(""), 50), "No description");
        assert_eq!(truncate(Some("short"), 50), "short");

        let long = "a".repeat(60);
        let cut = truncate(Some(&long), 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));

        let exact = "b".repeat(50);
        assert_eq!(truncate(Some(&exact), 50), exact);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let accented = "é".repeat(60);
        let cut = truncate(Some(&accented), 10);
        assert_eq!(cut, format!("{}...", "é".repeat(7)));
    }

    #[test]
    fn renders_totals_and_rows() {
        let txs = vec![
            Transaction {
                id: TransactionId::generate(),
                title: "Rent".to_string(),
                amount: Money::new(40000),
                kind: TxType::Expense,
                date: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
                description: None,
            },
            Transaction {
                id: TransactionId::generate(),
                title: "Salary".to_string(),
                amount: Money::new(100000),
                kind: TxType::Income,
                date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
                description: Some("May payroll".to_string()),
            },
        ];
        let report = render_text(&Summary::new(summary::totals(&txs), txs));

        assert!(report.contains("Income:        1000.00"));
        assert!(report.contains("Expenses:       400.00"));
        assert!(report.contains("Balance:        600.00"));
        assert!(report.contains("Transactions (2)"));

        let rent_line = report.lines().find(|l| l.contains("Rent")).unwrap();
        assert!(rent_line.starts_with("02/05/2024"));
        assert!(rent_line.contains("No description"));
        assert!(rent_line.contains("Expense"));
        assert!(rent_line.trim_end().ends_with("400.00"));

        let rent_pos = report.find("Rent").unwrap();
        let salary_pos = report.find("Salary").unwrap();
        assert!(rent_pos < salary_pos);
    }

    #[test]
    fn renders_empty_ledger() {
        let report = render_text(&Summary::new(Default::default(), Vec::new()));
        assert!(report.contains("Balance:          0.00"));
        assert!(report.contains("(none)"));
    }
}
