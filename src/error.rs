//! Error types for `cellcorr`.
//!
//! Every error is raised synchronously, before any parallel work starts. A
//! failed call leaves all accumulated state untouched.

use thiserror::Error;

/// Unified error type for grid construction, neighbor queries and
/// histogram accumulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A constructor argument or computation setting is unusable
    /// (non-positive bin count, cell width larger than half the box, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The query arguments are inconsistent with the requested mode or box.
    #[error("invalid query arguments: {0}")]
    InvalidQuery(String),

    /// Two inputs that must agree in length do not.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index refers past the end of the collection it indexes.
    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }

    /// Creates a query-argument error.
    pub fn query(message: impl Into<String>) -> Self {
        Error::InvalidQuery(message.into())
    }

    /// Creates a shape mismatch error.
    pub fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Error::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Returns true for [`Error::InvalidConfiguration`].
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = Error::config("cell width too large");
        assert_eq!(e.to_string(), "invalid configuration: cell width too large");
        assert!(e.is_invalid_configuration());

        let e = Error::shape("values", 3, 2);
        assert_eq!(e.to_string(), "shape mismatch for values: expected 3, got 2");
        assert!(!e.is_invalid_configuration());
    }
}
