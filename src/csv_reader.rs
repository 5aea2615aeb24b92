//! Minimal CSV reader for Pinpoint benchmark exports
//!
//! Not a general CSV reader: there is no quoting or escaping, a value that
//! contains a comma shifts every later column of its row. A row whose column
//! count disagrees with the header stops ingestion at that line.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Column delimiter used by Pinpoint exports
pub const DELIMITER: char = ',';

/// Errors that make an input file unusable
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name}: Empty header line!")]
    EmptyHeader { source_name: String },
}

/// One data line, keyed by header column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Build a row from (column, value) pairs; the first occurrence of a column wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key.into()).or_insert_with(|| value.into());
        }
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}

/// Where ingestion stopped because of a malformed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// 1-based line number in the input, counting blank lines
    pub line: usize,
    /// Number of columns found on that line
    pub found: usize,
    /// Number of columns in the header
    pub expected: usize,
}

/// Parsed CSV contents
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Set when a column-count mismatch cut ingestion short
    pub truncated_at: Option<Truncation>,
}

/// Split one line into columns, dropping a trailing carriage return
pub fn split_line(line: &str) -> Vec<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.split(DELIMITER).collect()
}

/// Parse CSV text; `source_name` only labels diagnostics
pub fn parse_csv(source_name: &str, text: &str) -> Result<CsvTable, CsvError> {
    let mut lines = text
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !matches!(*line, "" | "\r"));

    let Some((_, header_line)) = lines.next() else {
        return Err(CsvError::EmptyHeader {
            source_name: source_name.to_string(),
        });
    };

    let headers: Vec<String> = split_line(header_line)
        .into_iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(CsvError::EmptyHeader {
            source_name: source_name.to_string(),
        });
    }

    let mut table = CsvTable {
        headers,
        ..CsvTable::default()
    };

    for (line_no, line) in lines {
        let columns = split_line(line);
        if columns.len() != table.headers.len() {
            tracing::warn!(
                "{}: Line had {} columns, expected {}",
                source_name,
                columns.len(),
                table.headers.len()
            );
            table.truncated_at = Some(Truncation {
                line: line_no,
                found: columns.len(),
                expected: table.headers.len(),
            });
            break;
        }

        table.rows.push(Row::from_pairs(
            table.headers.iter().map(String::as_str).zip(columns),
        ));
    }

    tracing::debug!(
        source = source_name,
        columns = table.headers.len(),
        rows = table.rows.len(),
        truncated = table.truncated_at.is_some(),
        "parsed csv"
    );

    Ok(table)
}

/// Read a whole file into memory and parse it
pub fn read_csv_file(path: &Path) -> Result<CsvTable, CsvError> {
    let bytes = std::fs::read(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    parse_csv(&path.display().to_string(), &text)
}
