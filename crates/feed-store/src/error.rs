use std::fmt;

/// Errors produced by an [`crate::OrderStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Filesystem failure.
    Io(String),
    /// The flat file could not be read or written as CSV.
    Csv(String),
    /// The database rejected a query or could not be reached.
    Database(String),
    /// The backend is deliberately offline (tests, maintenance).
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "storage io error: {msg}"),
            StoreError::Csv(msg) => write!(f, "flat-file format error: {msg}"),
            StoreError::Database(msg) => write!(f, "database error: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e.to_string())
    }
}
