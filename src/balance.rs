// Balance Calculator
// Sums stored transactions into income / outcome / total

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::{get_all_transactions, Transaction, TransactionType};
use crate::error::{LedgerError, Result};

/// Aggregate over all transactions. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub income: Decimal,
    pub outcome: Decimal,
    pub total: Decimal,
}

impl Balance {
    /// Fold transactions into per-type sums.
    ///
    /// Fails with `BalanceOverflow` instead of wrapping when a sum leaves
    /// the `Decimal` range.
    pub fn from_transactions<'a, I>(transactions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut income = Decimal::ZERO;
        let mut outcome = Decimal::ZERO;

        for tx in transactions {
            match tx.transaction_type {
                TransactionType::Income => {
                    income = income
                        .checked_add(tx.value)
                        .ok_or(LedgerError::BalanceOverflow("income"))?;
                }
                TransactionType::Outcome => {
                    outcome = outcome
                        .checked_add(tx.value)
                        .ok_or(LedgerError::BalanceOverflow("outcome"))?;
                }
            }
        }

        let total = income
            .checked_sub(outcome)
            .ok_or(LedgerError::BalanceOverflow("net"))?;

        Ok(Balance {
            income,
            outcome,
            total,
        })
    }

    /// Whether an outcome of `value` fits in the current total
    pub fn covers(&self, value: Decimal) -> bool {
        value <= self.total
    }
}

/// Read every stored transaction and sum it up
pub fn get_balance(conn: &Connection) -> Result<Balance> {
    let transactions = get_all_transactions(conn)?;
    Balance::from_transactions(&transactions)
}
