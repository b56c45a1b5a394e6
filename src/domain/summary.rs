use serde::Serialize;

use crate::common::money::Money;
use crate::domain::transaction::{Transaction, TxType};

/// Derived totals. Always computed from scratch, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    pub balance: Money,
}

impl Totals {
    /// Totals with one more transaction counted, or `None` when a sum would
    /// leave the `i64` range.
    pub fn checked_record(&self, tx: &Transaction) -> Option<Totals> {
        let (income, expenses) = match tx.kind {
            TxType::Income => (self.income.checked_add(tx.amount)?, self.expenses),
            TxType::Expense => (self.income, self.expenses.checked_add(tx.amount)?),
        };
        Some(Totals {
            income,
            expenses,
            balance: income.checked_sub(expenses)?,
        })
    }
}

/// Read-only snapshot handed to report formatters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub income: Money,
    pub expenses: Money,
    pub balance: Money,
    pub transactions: Vec<Transaction>,
}

impl Summary {
    pub fn new(totals: Totals, transactions: Vec<Transaction>) -> Self {
        Self {
            income: totals.income,
            expenses: totals.expenses,
            balance: totals.balance,
            transactions,
        }
    }

    pub fn totals(&self) -> Totals {
        Totals {
            income: self.income,
            expenses: self.expenses,
            balance: self.balance,
        }
    }
}

fn total_of<'a>(txs: impl IntoIterator<Item = &'a Transaction>, kind: TxType) -> Money {
    txs.into_iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

pub fn total_income<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Money {
    total_of(txs, TxType::Income)
}

pub fn total_expenses<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Money {
    total_of(txs, TxType::Expense)
}

pub fn balance<'a>(txs: impl IntoIterator<Item = &'a Transaction> + Clone) -> Money {
    total_income(txs.clone()) - total_expenses(txs)
}

/// Computes all three totals in one pass.
pub fn totals<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let mut income = Money::ZERO;
    let mut expenses = Money::ZERO;
    for t in txs {
        match t.kind {
            TxType::Income => income += t.amount,
            TxType::Expense => expenses += t.amount,
        }
    }
    Totals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Like [`totals`], but `None` instead of saturating when a sum overflows.
pub fn checked_totals<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Option<Totals> {
    txs.into_iter()
        .try_fold(Totals::default(), |acc, t| acc.checked_record(t))
}
