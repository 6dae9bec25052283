use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid input '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Cohort table is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Invalid cohort record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
