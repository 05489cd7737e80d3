use std::io;

use thiserror::Error;

/// Errors that escape the adapter instead of being folded into a `false` result.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A configuration field was requested that the schema does not know.
    #[error("{0} is not a valid field.")]
    UnknownField(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The mount root could not be created.
    #[error("mount failure: {0}")]
    Mount(String),

    #[error("links are not supported: {0}")]
    LinkNotSupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result type alias for adapter construction and introspection.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
