use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::path::Path;
use std::str::FromStr;

use cashbook::{
    create_transaction, delete_transaction, get_balance, get_statement, import_transactions,
    import_upload, logging, open_database, Config, CreateTransaction,
};

const USAGE: &str = "Usage:
  cashbook import <file.csv>            import a CSV file (deleted on success)
  cashbook import-upload <name>         import a file from the upload directory
  cashbook add <title> <value> <type> <category>
  cashbook balance
  cashbook list
  cashbook delete <id>";

fn main() -> Result<()> {
    logging::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();

    let mut conn = open_database(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["import", file] => {
            let transactions = import_transactions(&mut conn, Path::new(file))
                .with_context(|| format!("Failed to import {}", file))?;
            println!("✓ Imported {} transactions from {}", transactions.len(), file);
            print_balance(&conn)?;
        }
        ["import-upload", name] => {
            let transactions = import_upload(&mut conn, &config.upload_dir, name)
                .with_context(|| format!("Failed to import upload {}", name))?;
            println!("✓ Imported {} transactions from upload {}", transactions.len(), name);
            print_balance(&conn)?;
        }
        ["add", title, value, kind, category] => {
            let value = Decimal::from_str(value)
                .with_context(|| format!("Invalid value: {}", value))?;
            let request = CreateTransaction::new(title, value, kind, category);
            let transaction = create_transaction(&mut conn, &request)?;
            println!("{}", serde_json::to_string_pretty(&transaction)?);
        }
        ["balance"] => print_balance(&conn)?,
        ["list"] => {
            let statement = get_statement(&conn)?;
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
        ["delete", id] => {
            delete_transaction(&conn, id)?;
            println!("✓ Deleted transaction {}", id);
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

fn print_balance(conn: &rusqlite::Connection) -> Result<()> {
    let balance = get_balance(conn)?;
    println!("{}", serde_json::to_string_pretty(&balance)?);
    Ok(())
}
