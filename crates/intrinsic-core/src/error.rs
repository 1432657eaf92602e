use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrinsicError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate result in {context}")]
    DegenerateResult { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl IntrinsicError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        IntrinsicError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for IntrinsicError {
    fn from(e: serde_json::Error) -> Self {
        IntrinsicError::SerializationError(e.to_string())
    }
}
