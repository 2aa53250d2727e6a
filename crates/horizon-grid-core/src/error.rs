//! Error types for Horizon Grid.
//!
//! Lookups never fail with an error: an invalid position or index yields
//! `None`. Errors are reserved for operations that are unsupported in their
//! context, malformed textual input (layer fixtures, persisted properties) and
//! file access.

use std::path::PathBuf;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur in the grid layer stack.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The operation is not supported in this context.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A layer fixture string could not be parsed.
    #[error("Invalid layer fixture '{fixture}': {message}")]
    InvalidFixture { fixture: String, message: String },

    /// A persisted property holds a value that cannot be interpreted.
    #[error("Invalid value for property '{key}': {message}")]
    InvalidProperty { key: String, message: String },

    /// A properties document could not be parsed.
    #[error("Failed to parse properties: {0}")]
    Parse(String),

    /// File I/O error.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GridError {
    /// Create an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create a fixture error.
    pub fn invalid_fixture(fixture: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFixture {
            fixture: fixture.into(),
            message: message.into(),
        }
    }

    /// Create a property error.
    pub fn invalid_property(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::invalid_fixture("100:x", "'x' is not a size");
        assert_eq!(
            err.to_string(),
            "Invalid layer fixture '100:x': 'x' is not a size"
        );

        let err = GridError::unsupported("editable rule needs a cell");
        assert!(err.to_string().contains("editable rule needs a cell"));
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error as _;

        let err = GridError::io(
            "/missing/state.properties",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/missing/state.properties"));
    }
}
