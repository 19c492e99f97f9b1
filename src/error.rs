//! Error types for the persistence layer.

use std::path::PathBuf;

/// Failure while turning a serialized field mapping back into a typed entity.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("field `{field}` has the wrong type: expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("field `{field}` is not a valid timestamp: {source}")]
    Timestamp {
        field: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: String, reason: String },

    #[error("`__class__` is `{found}` but `{expected}` was expected")]
    ClassMismatch { expected: String, found: String },
}

/// Errors surfaced by the storage engines.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed composite key `{0}`")]
    MalformedKey(String),

    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("cannot decode `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("no instance found for `{0}`")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::Constraint(message.unwrap_or_else(|| code.to_string()))
            }
            other => StorageError::Sqlite(other),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
