//! Ingest validation errors
//!
//! Raised at the load boundary before a document is adopted as a ledger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("transaction `{id}` is refunded but has no `refundTimestamp`")]
    MissingRefundTimestamp { id: String },

    #[error("transaction `{id}` needs either `amount` or both `grossAmount` and `netAmount`")]
    MissingAmount { id: String },
}

impl LedgerError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
