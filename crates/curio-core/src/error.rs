//! Error types for Curio

use thiserror::Error;

/// Result type alias using Curio's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Curio error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Concept errors (E001-E099)
    #[error("Concept '{identity}' not found. Run `curio concepts list` to see what I know.")]
    ConceptNotFound { identity: String },

    // Input errors (E100-E199)
    #[error("Ambiguous input: {0}")]
    AmbiguousInput(String),

    // Contract errors (E200-E299)
    #[error("Precondition violated: {0}")]
    Precondition(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record is invalid: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConceptNotFound { .. } => "E001",
            Self::AmbiguousInput(_) => "E100",
            Self::Precondition(_) => "E200",
            Self::Database(_) => "E400",
            Self::InvalidRecord(_) => "E401",
        }
    }

    /// Whether the conversation may recover from this error with an
    /// apologetic reply. Precondition failures are bugs and must surface
    /// to the caller instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Precondition(_))
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ConceptNotFound { .. } => Some("curio concepts list".to_string()),
            Self::Database(_) | Self::InvalidRecord(_) => Some("curio doctor".to_string()),
            _ => None,
        }
    }
}
