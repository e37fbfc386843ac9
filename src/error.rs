use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

#[derive(Error, Debug)]
pub enum ChoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} '{prefix}' not found")]
    UnknownId { kind: &'static str, prefix: String },

    #[error("{kind} id '{prefix}' is ambiguous ({matches} matches), use more characters")]
    AmbiguousId {
        kind: &'static str,
        prefix: String,
        matches: usize,
    },

    #[error("No household selected: {0}")]
    NoHousehold(String),

    #[error("{user} is not a member of household {household}")]
    NotAMember { user: String, household: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ChoreError> = std::result::Result<T, E>;
