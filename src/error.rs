use thiserror::Error;

/// Errors surfaced to the caller.
///
/// Only malformed input is an error. Empty matrices, unknown users, `top_n = 0`
/// and zero-magnitude vectors all resolve to well-defined outputs instead.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// A rating record is missing a required field
    #[error("record {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// A rating record field is present but unusable
    #[error("record {index}: invalid field `{field}`: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },

    /// Column table payload whose columns have different lengths
    #[error("column `{field}` has {actual} entries, expected {expected}")]
    ColumnLengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Nested mapping that cannot be read as a matrix
    #[error("invalid matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Cbor(#[from] serde_cbor::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
