// Bulk Importer
// CSV file → categories + transactions in one storage transaction

use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::balance::get_balance;
use crate::db::{insert_transactions, Transaction};
use crate::entities::category::resolve_titles;
use crate::error::{LedgerError, Result};
use crate::parser::parse_csv;

/// Import every row of `csv_path`, then delete the file.
///
/// All-or-nothing: rows are parsed and validated before anything is
/// written, and category creation plus the transaction batch share one
/// storage transaction. Rows whose values would push the stored income or
/// outcome sum out of range are rejected as bad content. On failure the
/// file is left in place.
///
/// Removing the file happens after commit. If that fails the rows stay
/// stored, a warning is logged and the import still reports success.
pub fn import_transactions(conn: &mut Connection, csv_path: &Path) -> Result<Vec<Transaction>> {
    let rows = parse_csv(csv_path)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let categories = resolve_titles(&tx, rows.iter().map(|row| row.category.as_str()))?;

    let transactions = rows
        .into_iter()
        .map(|row| -> Result<Transaction> {
            let category_id = categories.id_of(&row.category).ok_or_else(|| {
                LedgerError::InvalidFileContent(format!(
                    "line {}: unresolved category {:?}",
                    row.line, row.category
                ))
            })?;

            Ok(Transaction::new(
                row.title,
                row.value,
                row.transaction_type,
                category_id.to_string(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let inserted = insert_transactions(&tx, &transactions)?;

    get_balance(&tx).map_err(|e| match e {
        LedgerError::BalanceOverflow(kind) => {
            LedgerError::InvalidFileContent(format!("{} total out of range", kind))
        }
        other => other,
    })?;

    tx.commit()?;

    discard_source(csv_path);

    info!(
        file = %csv_path.display(),
        transactions = inserted,
        new_categories = categories.created.len(),
        "import complete"
    );

    Ok(transactions)
}

/// Delete an imported file. Returns whether it was removed.
fn discard_source(csv_path: &Path) -> bool {
    match fs::remove_file(csv_path) {
        Ok(()) => true,
        Err(e) => {
            warn!(file = %csv_path.display(), error = %e, "imported file not removed");
            false
        }
    }
}

/// Resolve an uploaded file name inside `upload_dir`.
///
/// Only the final path component of `file_name` is used, so a name cannot
/// point outside the upload directory.
pub fn upload_path(upload_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let name = Path::new(file_name).file_name().ok_or_else(|| {
        LedgerError::InvalidFileContent(format!("invalid upload file name {:?}", file_name))
    })?;

    Ok(upload_dir.join(name))
}

/// Import a file previously stored in the upload directory
pub fn import_upload(
    conn: &mut Connection,
    upload_dir: &Path,
    file_name: &str,
) -> Result<Vec<Transaction>> {
    let csv_path = upload_path(upload_dir, file_name)?;
    import_transactions(conn, &csv_path)
}
