//! Application error types.

use thiserror::Error;

/// Application-level errors for Graphshift.
#[derive(Error, Debug)]
pub enum AppError {
    // Neo4j errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    // Migration errors
    #[error(
        "Property `{to}` is already defined in `{label}`. To handle this issue, \
         remove it with `remove_property({label}, {to})` first, then rename `{from}` to `{to}`"
    )]
    DuplicateTarget {
        label: String,
        from: String,
        to: String,
    },

    #[error("Duplicate constraint for {label}#{property}")]
    DuplicateConstraint { label: String, property: String },

    #[error("No such constraint for {label}#{property}")]
    NoSuchConstraint { label: String, property: String },

    #[error("Duplicate index for {label}#{property}")]
    DuplicateIndex { label: String, property: String },

    #[error("No such index for {label}#{property}")]
    NoSuchIndex { label: String, property: String },

    #[error("No id property registered for label {0}")]
    UnknownIdProperty(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for the duplicate/missing schema errors raised by the
    /// helpers before any statement reaches the store.
    pub fn is_schema_conflict(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateTarget { .. }
                | AppError::DuplicateConstraint { .. }
                | AppError::NoSuchConstraint { .. }
                | AppError::DuplicateIndex { .. }
                | AppError::NoSuchIndex { .. }
        )
    }
}
