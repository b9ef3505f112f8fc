use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Numeric overflow computing {context}; inputs exceed the decimal range")]
    Overflow { context: String },
}
