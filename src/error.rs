use thiserror::Error;

/// Batch-level failure for an analysis run. Any of these abandons the whole run.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not build spreadsheet export: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Column '{column}' row {row}: expected a number, found '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("{0}: no worksheet or header row found")]
    EmptySheet(String),

    #[error("Export has {0} columns; a worksheet holds at most 16384")]
    TooManyColumns(usize),

    #[error("Join produced no rows: no invoice is present in all three files")]
    EmptyJoin,
}

impl RiskError {
    pub fn missing_column(column: &str, source_name: &str) -> Self {
        RiskError::MissingColumn {
            column: column.to_string(),
            source_name: source_name.to_string(),
        }
    }
}
