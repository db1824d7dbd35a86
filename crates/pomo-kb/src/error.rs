use std::fmt;

use pomo_core::CoherenceError;

#[derive(Debug)]
pub enum KbError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The snapshot parsed but failed engine validation.
    Invalid(CoherenceError),
}

impl fmt::Display for KbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KbError::Io(e) => write!(f, "knowledge base I/O error: {e}"),
            KbError::Json(e) => write!(f, "knowledge base JSON error: {e}"),
            KbError::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for KbError {}

impl From<std::io::Error> for KbError {
    fn from(e: std::io::Error) -> Self {
        KbError::Io(e)
    }
}

impl From<serde_json::Error> for KbError {
    fn from(e: serde_json::Error) -> Self {
        KbError::Json(e)
    }
}

impl From<CoherenceError> for KbError {
    fn from(e: CoherenceError) -> Self {
        KbError::Invalid(e)
    }
}

pub type Result<T> = std::result::Result<T, KbError>;
