use crate::error::{Rejection, Result};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A signed money movement: positive for a sale, negative for a purchase.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    amount: f64,
}

impl Transaction {
    pub fn new(amount: f64) -> Transaction {
        Transaction { amount }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Window {
    All,
    Last(usize),
}

impl From<i64> for Window {
    /// Any negative count means the whole history.
    fn from(count: i64) -> Window {
        usize::try_from(count).map_or(Window::All, Window::Last)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub income: f64,
    pub expenditure: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+ {:.2} - {:.2}", self.income, self.expenditure)
    }
}

pub struct TransactionLedger {
    transactions: RecordStore<Transaction>,
}

impl TransactionLedger {
    pub fn open(path: impl AsRef<Path>) -> Result<TransactionLedger> {
        Ok(TransactionLedger {
            transactions: RecordStore::open(path)?,
        })
    }

    pub fn record(&mut self, amount: f64) -> Result<()> {
        self.transactions.push(Transaction::new(amount));
        self.transactions.save()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    /// Income and expenditure over `window`.
    ///
    /// `Last(0)` yields `None`, printed as an empty line.
    pub fn summarize(&self, window: Window) -> Result<Option<Summary>> {
        let all = self.transactions.records();
        let recent = match window {
            Window::All => all,
            Window::Last(0) => return Ok(None),
            Window::Last(count) if count > all.len() => {
                return Err(Rejection::WindowTooLarge.into())
            }
            Window::Last(count) => &all[all.len() - count..],
        };

        let summary = recent.iter().fold(Summary::default(), |mut acc, tx| {
            if tx.is_income() {
                acc.income += tx.amount;
            } else {
                acc.expenditure -= tx.amount;
            }
            acc
        });
        Ok(Some(summary))
    }
}
