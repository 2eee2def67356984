// Cashbook - Core Library
// Income/outcome bookkeeping over SQLite: balance, creation, CSV import

pub mod balance;
pub mod config;
pub mod creator;
pub mod db;
pub mod entities;
pub mod error;
pub mod importer;
pub mod logging;
pub mod parser;

// Re-export commonly used types
pub use balance::{get_balance, Balance};
pub use config::Config;
pub use creator::{create_transaction, CreateTransaction};
pub use db::{
    Transaction, TransactionType, TransactionView, Statement,
    open_database, setup_database, insert_transaction, insert_transactions,
    get_all_transactions, find_transaction, delete_transaction, get_statement,
    verify_count,
};
pub use entities::{Category, ResolvedCategories};
pub use error::{LedgerError, Result};
pub use importer::{import_transactions, import_upload};
pub use parser::{parse_csv, CsvTransaction};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
