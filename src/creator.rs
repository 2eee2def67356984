// Transaction Creator
// Validates one request, resolves its category and persists it atomically

use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::balance::get_balance;
use crate::db::{insert_transaction, Transaction, TransactionType};
use crate::entities::category::find_or_create;
use crate::error::{LedgerError, Result};

/// Input for a single transaction.
///
/// `transaction_type` stays a raw string: rejecting anything other than
/// "income" / "outcome" is part of creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub title: String,
    pub value: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub category: String,
}

impl CreateTransaction {
    pub fn new(title: &str, value: Decimal, transaction_type: &str, category: &str) -> Self {
        CreateTransaction {
            title: title.to_string(),
            value,
            transaction_type: transaction_type.to_string(),
            category: category.to_string(),
        }
    }
}

fn validate(request: &CreateTransaction) -> Result<TransactionType> {
    let transaction_type: TransactionType = request.transaction_type.parse()?;

    if request.title.trim().is_empty() {
        return Err(LedgerError::InvalidTransaction("title is required".to_string()));
    }

    if request.value <= Decimal::ZERO {
        return Err(LedgerError::InvalidTransaction(format!(
            "value must be positive, got {}",
            request.value
        )));
    }

    if request.category.trim().is_empty() {
        return Err(LedgerError::InvalidTransaction("category is required".to_string()));
    }

    Ok(transaction_type)
}

/// Create and persist one transaction.
///
/// Checks run in order: type, field contents, then funds for outcomes.
/// The funds check, category creation and insert share one IMMEDIATE
/// storage transaction, so two creators cannot both spend the same total
/// and a rejected request leaves no category behind. A value that would
/// push the income or outcome sum out of range is rejected with
/// `BalanceOverflow` before commit.
pub fn create_transaction(conn: &mut Connection, request: &CreateTransaction) -> Result<Transaction> {
    let transaction_type = validate(request).map_err(|e| {
        warn!(title = %request.title, error = %e, "transaction rejected");
        e
    })?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if transaction_type == TransactionType::Outcome {
        let balance = get_balance(&tx)?;

        if !balance.covers(request.value) {
            warn!(
                title = %request.title,
                requested = %request.value,
                available = %balance.total,
                "transaction rejected: insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                requested: request.value,
                available: balance.total,
            });
        }
    }

    let category = find_or_create(&tx, &request.category)?;

    let transaction = Transaction::new(
        request.title.clone(),
        request.value,
        transaction_type,
        category.id,
    );
    insert_transaction(&tx, &transaction)?;

    // Stored sums must stay representable after the insert
    get_balance(&tx).map_err(|e| {
        warn!(title = %request.title, error = %e, "transaction rejected");
        e
    })?;

    tx.commit()?;

    info!(
        id = %transaction.id,
        kind = %transaction.transaction_type,
        value = %transaction.value,
        "transaction created"
    );

    Ok(transaction)
}
