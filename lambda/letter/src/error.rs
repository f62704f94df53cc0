use thiserror::Error;

/// Failures surfaced to the caller as `{"error": ...}`.
#[derive(Debug, Error)]
pub(crate) enum LetterError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    Internal(String),
}

impl LetterError {
    pub(crate) fn status_code(&self) -> u16 {
        match self {
            LetterError::Validation(_) => 400,
            LetterError::NotFound(_) => 404,
            LetterError::MethodNotAllowed(_) => 405,
            LetterError::Internal(_) => 500,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("{0}")]
    Sdk(String),
    #[error("stored letter has a missing or malformed `{0}` attribute")]
    MalformedItem(&'static str),
}
