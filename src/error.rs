use rust_decimal::Decimal;
use thiserror::Error;

/// Failures reported by the bookkeeping core.
///
/// Validation variants carry a human-readable message. Storage, CSV and
/// file-system failures are passed through unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("The transaction type can just be income or outcome (got {0:?})")]
    InvalidTransactionType(String),

    #[error("Transaction value not allowed: {requested} exceeds available balance {available}")]
    InsufficientFunds { requested: Decimal, available: Decimal },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("File content invalid: {0}")]
    InvalidFileContent(String),

    #[error("Balance out of range: {0} total exceeds the representable amount")]
    BalanceOverflow(&'static str),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
