// Credvault — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("no matching row".to_string()),
            other => StoreError::Database(other),
        }
    }
}

/// Rejections raised while reading caller-supplied forms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unsupported record type: {0}")]
    UnknownKind(String),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("form has no fields to update")]
    NothingToUpdate,
}
