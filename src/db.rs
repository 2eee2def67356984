use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::balance::Balance;
use crate::error::{LedgerError, Result};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Outcome,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match only: "Income" or " income" are rejected.
impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(TransactionType::Income),
            "outcome" => Ok(TransactionType::Outcome),
            other => Err(LedgerError::InvalidTransactionType(other.to_string())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: LedgerError| FromSqlError::Other(Box::new(e)))
    }
}

/// A persisted income or outcome record.
///
/// `id` is a UUID assigned at construction; the value is kept as a decimal
/// and stored as canonical text so sums never drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    pub value: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        title: String,
        value: Decimal,
        transaction_type: TransactionType,
        category_id: String,
    ) -> Self {
        let now = Utc::now();

        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            value,
            transaction_type,
            category_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }
}

/// Transaction joined with the title of its category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: String,
}

/// Every transaction plus the balance they add up to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub transactions: Vec<TransactionView>,
    pub balance: Balance,
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    info!(path = %db_path.display(), "database opened");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases answer "memory"
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    // Off by default in SQLite, and per-connection
    conn.pragma_update(None, "foreign_keys", true)?;

    // ==========================================================================
    // Categories Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            title TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            value TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'outcome')),
            category_id TEXT NOT NULL REFERENCES categories(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type)",
        [],
    )?;

    Ok(())
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_value(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const TRANSACTION_COLUMNS: &str =
    "t.id, t.title, t.value, t.type, t.category_id, t.created_at, t.updated_at";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let value: String = row.get(2)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        value: parse_value(2, &value)?,
        transaction_type: row.get(3)?,
        category_id: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<()> {
    insert_transactions(conn, std::slice::from_ref(tx)).map(|_| ())
}

/// Insert a batch of transactions in order, reusing one prepared statement.
///
/// Callers wanting all-or-nothing semantics pass a `rusqlite::Transaction`.
pub fn insert_transactions(conn: &Connection, transactions: &[Transaction]) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (
            id, title, value, type, category_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for tx in transactions {
        stmt.execute(params![
            tx.id,
            tx.title,
            tx.value.to_string(),
            tx.transaction_type,
            tx.category_id,
            tx.created_at.to_rfc3339(),
            tx.updated_at.to_rfc3339(),
        ])?;
    }

    Ok(transactions.len())
}

/// All transactions, oldest first
pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions t ORDER BY t.row_id"
    ))?;

    let transactions = stmt
        .query_map([], transaction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(transactions)
}

pub fn find_transaction(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    let transaction = conn
        .query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.id = ?1"),
            [id],
            transaction_from_row,
        )
        .optional()?;

    Ok(transaction)
}

/// Remove one transaction. Its category stays behind.
pub fn delete_transaction(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;

    if deleted == 0 {
        return Err(LedgerError::TransactionNotFound(id.to_string()));
    }

    info!(id, "transaction deleted");
    Ok(())
}

/// All transactions with their category titles, plus the current balance
pub fn get_statement(conn: &Connection) -> Result<Statement> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS}, c.title
         FROM transactions t
         JOIN categories c ON c.id = t.category_id
         ORDER BY t.row_id"
    ))?;

    let transactions = stmt
        .query_map([], |row| {
            Ok(TransactionView {
                transaction: transaction_from_row(row)?,
                category: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let balance = Balance::from_transactions(transactions.iter().map(|v| &v.transaction))?;

    Ok(Statement {
        transactions,
        balance,
    })
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::category::find_or_create;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn create_test_transaction(
        conn: &Connection,
        title: &str,
        value: &str,
        tx_type: TransactionType,
        category: &str,
    ) -> Transaction {
        let category = find_or_create(conn, category).unwrap();
        Transaction::new(title.to_string(), dec(value), tx_type, category.id)
    }

    #[test]
    fn test_setup_database_is_idempotent() {
        let conn = setup();
        setup_database(&conn).unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_transaction_type_parsing() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("outcome".parse::<TransactionType>().unwrap(), TransactionType::Outcome);

        for bad in ["Income", "OUTCOME", " income", "transfer", ""] {
            let err = bad.parse::<TransactionType>().unwrap_err();
            assert!(matches!(err, LedgerError::InvalidTransactionType(ref t) if t == bad));
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = setup();

        let transactions = vec![
            create_test_transaction(&conn, "Salary", "5000.00", TransactionType::Income, "Job"),
            create_test_transaction(&conn, "Coffee", "3.75", TransactionType::Outcome, "Food"),
        ];

        let inserted = insert_transactions(&conn, &transactions).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(verify_count(&conn).unwrap(), 2);

        let stored = get_all_transactions(&conn).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title, "Salary");
        assert_eq!(stored[0].value, dec("5000.00"));
        assert!(stored[0].is_income());
        assert_eq!(stored[1].title, "Coffee");
        assert_eq!(stored[1].value, dec("3.75"));
        assert_eq!(stored[1].transaction_type, TransactionType::Outcome);
        assert_eq!(stored[1].category_id, transactions[1].category_id);
    }

    #[test]
    fn test_find_transaction() {
        let conn = setup();
        let tx = create_test_transaction(&conn, "Book", "42.10", TransactionType::Outcome, "Study");
        insert_transaction(&conn, &tx).unwrap();

        let found = find_transaction(&conn, &tx.id).unwrap().unwrap();
        assert_eq!(found.id, tx.id);
        assert_eq!(found.value, tx.value);

        assert!(find_transaction(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_unknown_category_is_rejected_by_foreign_key() {
        let conn = setup();
        let tx = Transaction::new(
            "Orphan".to_string(),
            dec("1"),
            TransactionType::Income,
            "no-such-category".to_string(),
        );

        let err = insert_transaction(&conn, &tx).unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_delete_transaction() {
        let conn = setup();
        let tx = create_test_transaction(&conn, "Gym", "30", TransactionType::Outcome, "Health");
        insert_transaction(&conn, &tx).unwrap();

        delete_transaction(&conn, &tx.id).unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 0);

        let err = delete_transaction(&conn, &tx.id).unwrap_err();
        assert!(matches!(err, LedgerError::TransactionNotFound(ref id) if *id == tx.id));
    }

    #[test]
    fn test_statement_joins_category_titles() {
        let conn = setup();
        let transactions = vec![
            create_test_transaction(&conn, "Salary", "5000", TransactionType::Income, "Job"),
            create_test_transaction(&conn, "Rent", "1200", TransactionType::Outcome, "Housing"),
        ];
        insert_transactions(&conn, &transactions).unwrap();

        let statement = get_statement(&conn).unwrap();
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.transactions[0].category, "Job");
        assert_eq!(statement.transactions[1].category, "Housing");
        assert_eq!(statement.balance.total, dec("3800"));
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let conn = setup();
        let tx = create_test_transaction(&conn, "Salary", "10.5", TransactionType::Income, "Job");

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "income");
        assert_eq!(json["value"], "10.5");
    }
}
