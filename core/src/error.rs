use thiserror::Error;

use crate::types::Year;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid parameter '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Computation failed in year {year} for '{field}': {message}")]
    Computation {
        year:    Year,
        field:   String,
        message: String,
    },

    #[error("Monte Carlo run cancelled")]
    Cancelled,

    #[cfg(feature = "archive")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field:   field.into(),
            message: message.into(),
        }
    }

    pub fn computation(year: Year, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Computation {
            year,
            field:   field.into(),
            message: message.into(),
        }
    }

    /// Validation errors are caller mistakes; they are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;
