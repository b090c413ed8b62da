// Credvault — Top-level error types
//
// Every service operation fails with one of four kinds. Store and codec
// errors never escape raw: they are wrapped with the name of the operation
// that hit them and classified into the taxonomy below.

use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;
use crate::store::{FormError, StoreError};

/// Classification of a failure, independent of its cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Internal,
}

impl ErrorKind {
    /// HTTP status an API surface must report for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotFound => "not found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all Credvault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{op}: invalid input: {reason}")]
    InvalidInput { op: &'static str, reason: String },

    #[error("{op}: not found: {what}")]
    NotFound { op: &'static str, what: String },

    #[error("{op}: forbidden")]
    Forbidden { op: &'static str },

    #[error("{op}: internal error: {reason}")]
    Internal { op: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::InvalidInput { .. } => ErrorKind::InvalidInput,
            VaultError::NotFound { .. } => ErrorKind::NotFound,
            VaultError::Forbidden { .. } => ErrorKind::Forbidden,
            VaultError::Internal { .. } | VaultError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn invalid_input(op: &'static str, reason: impl Into<String>) -> Self {
        VaultError::InvalidInput {
            op,
            reason: reason.into(),
        }
    }

    /// Classify a store failure. Missing rows become `NotFound`; anything
    /// else the store reports is internal.
    pub fn store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => VaultError::NotFound { op, what },
            other => VaultError::Internal {
                op,
                reason: other.to_string(),
            },
        }
    }

    pub fn codec(op: &'static str, err: CodecError) -> Self {
        VaultError::Internal {
            op,
            reason: err.to_string(),
        }
    }

    pub fn form(op: &'static str, err: FormError) -> Self {
        VaultError::invalid_input(op, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
