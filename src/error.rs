use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CotejoError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No compatible header found (expected Fecha plus Débito/Crédito or a description column)")]
    NoCompatibleHeader,

    #[error("No compatible table found: headers were detected but no rows survived")]
    NoCompatibleTable,

    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Unknown bank format: {0}")]
    UnknownFormat(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ledger returned no rows for '{0}', cannot reconcile")]
    EmptyLedger(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, CotejoError>;

impl CotejoError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
