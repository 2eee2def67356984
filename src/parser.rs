// 🏗️ CSV Parser - rows of `title, type, value, category`
//
// Fields are separated by ", " and the first line is a header. A bare
// comma stays inside its field ("Loan,Bank"), double quotes work as in
// plain CSV and fields are trimmed. A blank line between rows, or any row
// missing a required field, fails the whole file. Trailing blank lines
// are ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::db::TransactionType;
use crate::error::{LedgerError, Result};

/// Number of columns every data row must have
pub const EXPECTED_FIELDS: usize = 4;

/// Single-byte stand-in for the ", " separator handed to the csv reader
const FIELD_SEPARATOR: u8 = 0x1f;

/// One validated CSV row, before its category is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvTransaction {
    pub title: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub value: Decimal,
    pub category: String,

    /// Line in the source file (1-indexed, header is line 1)
    pub line: u64,
}

/// Parse a CSV file from disk.
///
/// The file is read once; nothing is written until every row has parsed.
pub fn parse_csv(csv_path: &Path) -> Result<Vec<CsvTransaction>> {
    let content = fs::read_to_string(csv_path)?;
    parse_str(&content)
}

/// Parse CSV content from any reader
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Vec<CsvTransaction>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_str(&content)
}

fn parse_str(content: &str) -> Result<Vec<CsvTransaction>> {
    let folded = fold_separators(content)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(FIELD_SEPARATOR)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(folded.as_bytes());

    let mut transactions = Vec::new();

    for result in rdr.records() {
        let record = result?;
        transactions.push(parse_record(&record)?);
    }

    Ok(transactions)
}

/// Rewrite every ", " outside double quotes to `FIELD_SEPARATOR`.
///
/// Line numbers are preserved. A blank line followed by more content is
/// reported as an empty row; blank lines at the end are dropped.
fn fold_separators(content: &str) -> Result<String> {
    let separator = char::from(FIELD_SEPARATOR);
    let mut folded = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    let mut in_quotes = false;
    let mut line: u64 = 1;
    let mut line_is_blank = true;
    let mut first_blank: Option<u64> = None;

    while let Some(c) = chars.next() {
        if c == separator {
            return Err(content_error(line, "unexpected control character"));
        }

        if !c.is_whitespace() {
            if let Some(blank) = first_blank {
                return Err(content_error(blank, "empty row"));
            }
            line_is_blank = false;
        }

        match c {
            '"' => {
                in_quotes = !in_quotes;
                folded.push(c);
            }
            ',' if !in_quotes && chars.peek() == Some(&' ') => {
                chars.next();
                folded.push(separator);
            }
            '\n' => {
                if !in_quotes {
                    if line_is_blank {
                        first_blank.get_or_insert(line);
                    }
                    line_is_blank = true;
                }
                line += 1;
                folded.push(c);
            }
            _ => folded.push(c),
        }
    }

    // Only whitespace can follow the last content line here
    folded.truncate(folded.trim_end().len());
    Ok(folded)
}

fn parse_record(record: &StringRecord) -> Result<CsvTransaction> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    if record.len() > EXPECTED_FIELDS {
        return Err(content_error(
            line,
            &format!("expected {} fields, found {}", EXPECTED_FIELDS, record.len()),
        ));
    }

    let title = required(record, 0, "title", line)?;
    let raw_type = required(record, 1, "type", line)?;
    let raw_value = required(record, 2, "value", line)?;
    let category = required(record, 3, "category", line)?;

    let transaction_type = TransactionType::from_str(raw_type)
        .map_err(|_| content_error(line, &format!("invalid type {:?}", raw_type)))?;

    let value = Decimal::from_str(raw_value)
        .map_err(|_| content_error(line, &format!("invalid value {:?}", raw_value)))?;

    if value <= Decimal::ZERO {
        return Err(content_error(line, &format!("value must be positive, got {}", value)));
    }

    Ok(CsvTransaction {
        title: title.to_string(),
        transaction_type,
        value,
        category: category.to_string(),
        line,
    })
}

fn required<'r>(record: &'r StringRecord, idx: usize, field: &str, line: u64) -> Result<&'r str> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(content_error(line, &format!("missing {}", field))),
    }
}

fn content_error(line: u64, message: &str) -> LedgerError {
    LedgerError::InvalidFileContent(format!("line {}: {}", line, message))
}
