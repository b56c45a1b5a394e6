use std::{fs::File, io::Write, path::PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::{
    common::error::AppError,
    domain::transaction::{Transaction, TransactionId, TransactionPatch, TxFilter, TxType},
    io::{
        persistence::PersistenceAdapter,
        report,
        storage::{FileStore, KeyValueStore},
        writer,
    },
    settings::Settings,
    worker::store::LedgerStore,
};

#[derive(Debug, Parser)]
#[command(name = "finance", about = "Track income and expenses", version)]
pub struct Cli {
    /// Config file path (TOML). Defaults to ./finance.toml when present.
    #[arg(long, env = "FINANCE_CONFIG")]
    pub config: Option<String>,
    /// Override the data directory.
    #[arg(long)]
    pub data_dir: Option<String>,
    /// Override the storage slot name.
    #[arg(long)]
    pub slot: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new transaction.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long = "type", value_parser = parse_type)]
        kind: TxType,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of an existing transaction.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        #[arg(long = "type", value_parser = parse_type)]
        kind: Option<TxType>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        /// Set the transaction date to now.
        #[arg(long)]
        touch: bool,
    },
    /// Remove a transaction.
    Delete { id: String },
    /// List transactions, newest first.
    List {
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: TxFilter,
    },
    /// Print income, expenses and balance.
    Summary,
    /// Print a full text report.
    Report {
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: TxFilter,
    },
    /// Export transactions as CSV.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: TxFilter,
    },
}

fn parse_type(s: &str) -> Result<TxType, String> {
    s.parse()
}

fn parse_filter(s: &str) -> Result<TxFilter, String> {
    s.parse()
}

fn parse_id(s: &str) -> Result<TransactionId, AppError> {
    s.parse()
        .map_err(|e| AppError::Parse(format!("invalid transaction id {s:?}: {e}")))
}

/// Opens the file-backed ledger, runs one command and closes the ledger.
pub async fn run(cli: Cli, settings: &Settings) -> Result<(), AppError> {
    let dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.storage.dir.clone());
    let slot = cli
        .slot
        .clone()
        .unwrap_or_else(|| settings.storage.slot.clone());

    let store = LedgerStore::new(PersistenceAdapter::with_slot(FileStore::new(dir), slot));
    store.init().await?;

    let mut out = Vec::new();
    let result = execute(&store, cli.command, &mut out).await;
    store.dispose().await;

    std::io::stdout().write_all(&out)?;
    result
}

/// Runs a single command against an initialized store, writing
/// human-readable output to `out`.
pub async fn execute<S, W>(
    store: &LedgerStore<S>,
    command: Command,
    out: &mut W,
) -> Result<(), AppError>
where
    S: KeyValueStore,
    W: Write,
{
    match command {
        Command::Add {
            title,
            amount,
            kind,
            description,
        } => {
            let tx = store
                .add(&title, &amount, kind, description.as_deref())
                .await?;
            writeln!(out, "added {}", format_row(&tx))?;
        }
        Command::Edit {
            id,
            title,
            amount,
            kind,
            description,
            clear_description,
            touch,
        } => {
            let id = parse_id(&id)?;
            let mut patch = TransactionPatch {
                title,
                amount,
                kind,
                ..TransactionPatch::default()
            };
            if clear_description {
                patch = patch.description(None);
            } else if description.is_some() {
                patch = patch.description(description);
            }
            if touch {
                patch = patch.date(Utc::now());
            }
            if patch.is_empty() {
                return Err(AppError::Parse("nothing to change".to_string()));
            }
            let tx = store.update(id, patch).await?;
            writeln!(out, "updated {}", format_row(&tx))?;
        }
        Command::Delete { id } => {
            let tx = store.delete(parse_id(&id)?).await?;
            writeln!(out, "deleted {}", format_row(&tx))?;
        }
        Command::List { filter } => {
            for tx in store.list(filter).await? {
                writeln!(out, "{}", format_row(&tx))?;
            }
        }
        Command::Summary => {
            let totals = store.totals().await?;
            writeln!(out, "income:   {}", totals.income)?;
            writeln!(out, "expenses: {}", totals.expenses)?;
            writeln!(out, "balance:  {}", totals.balance)?;
        }
        Command::Report { filter } => {
            let summary = store.summary(filter).await?;
            write!(out, "{}", report::render_text(&summary))?;
        }
        Command::Export { output, filter } => {
            let txs = store.list(filter).await?;
            match output {
                Some(path) => {
                    writer::write_csv(File::create(&path)?, &txs)?;
                    writeln!(out, "exported {} transactions to {}", txs.len(), path.display())?;
                }
                None => writer::write_csv(&mut *out, &txs)?,
            }
        }
    }
    Ok(())
}

fn format_row(tx: &Transaction) -> String {
    let mut row = format!(
        "{}  {}  {:<7}  {:>10}  {}",
        tx.id,
        tx.date.format("%Y-%m-%d %H:%M"),
        tx.kind.as_str(),
        tx.amount.to_string_2dp(),
        tx.title
    );
    if let Some(description) = &tx.description {
        row.push_str(" - ");
        row.push_str(description);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_negative_amount_for_validation() {
        let cli = Cli::try_parse_from([
            "finance", "add", "--title", "Coffee", "--amount", "-5", "--type", "expense",
        ])
        .unwrap();

        match cli.command {
            Command::Add { amount, kind, .. } => {
                assert_eq!(amount, "-5");
                assert_eq!(kind, TxType::Expense);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let res = Cli::try_parse_from([
            "finance", "add", "--title", "x", "--amount", "1", "--type", "refund",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn edit_flags_conflict() {
        let res = Cli::try_parse_from([
            "finance",
            "edit",
            "5d0e3a55-7b3e-4c4f-8a7e-6f1a2b3c4d5e",
            "--description",
            "x",
            "--clear-description",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn global_overrides_and_filter_default() {
        let cli = Cli::try_parse_from(["finance", "--data-dir", "/tmp/d", "--slot", "s", "list"])
            .unwrap();

        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/d"));
        assert_eq!(cli.slot.as_deref(), Some("s"));
        assert!(matches!(
            cli.command,
            Command::List {
                filter: TxFilter::All
            }
        ));
    }

    #[test]
    fn bad_id_is_a_parse_error() {
        assert!(matches!(parse_id("nope"), Err(AppError::Parse(_))));
    }
}
