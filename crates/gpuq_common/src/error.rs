//! Error types for gpuq.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    /// One report could not be parsed. The report is skipped.
    #[error("Report {report_id} is malformed: {reason}")]
    CorpusEntryMalformed { report_id: u64, reason: String },

    #[error("Architecture taxonomy is malformed: {0}")]
    TaxonomySourceMalformed(String),

    #[error("Reference constants are malformed: {0}")]
    ConstantSourceMalformed(String),

    #[error("Unknown {namespace} constant: {name}")]
    UnknownConstant { namespace: &'static str, name: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub fn malformed(report_id: u64, reason: impl ToString) -> Self {
        QueryError::CorpusEntryMalformed {
            report_id,
            reason: reason.to_string(),
        }
    }

    /// Whether the batch may continue past this error.
    ///
    /// Only a single malformed report is recoverable; everything else aborts
    /// the run before any aggregate is produced.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QueryError::CorpusEntryMalformed { .. })
    }
}
