// src/error.rs

use std::io;

use thiserror::Error;

/// Failures surfaced by the participant registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no participant with key `{key}`")]
    NotFound { key: String },

    /// More than one record carries the same key. This is a data-integrity
    /// fault in the list file, not a normal lookup miss.
    #[error("participant key `{key}` is shared by {count} records")]
    AmbiguousKey { key: String, count: usize },

    #[error("column `{column}` not found in data table")]
    MissingColumn { column: String },

    #[error("invalid participant name `{raw}`")]
    InvalidIdentifier { raw: String },

    #[error("participant key `{key}` already belongs to another record")]
    DuplicateKey { key: String },

    #[error("form not completed correctly")]
    FormIncomplete,

    #[error("no participant list loaded")]
    NoListLoaded,

    #[error("`{op}` is not allowed while the session is {state}")]
    InvalidState { op: &'static str, state: &'static str },

    #[error("participant list I/O: {0}")]
    Io(#[from] io::Error),

    #[error("participant list CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
