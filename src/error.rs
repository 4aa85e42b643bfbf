//! Error types for the FP&A copilot

use crate::models::Period;
use thiserror::Error;

/// Result type alias for copilot operations
pub type Result<T> = std::result::Result<T, CopilotError>;

#[derive(Error, Debug)]
pub enum CopilotError {

    // =============================
    // Query Pipeline Errors
    // =============================

    #[error("no FX rate loaded for {currency} in {period}")]
    MissingFxRate { period: Period, currency: String },

    #[error("no {table} rows for {scope} in {period}")]
    InsufficientData {
        table: &'static str,
        period: Period,
        scope: String,
    },

    #[error("could not classify question: {0}")]
    UnrecognizedIntent(String),

    #[error("data load error: {0}")]
    DataLoad(String),

    #[error("audit error: {0}")]
    Audit(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("UUID parse error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
