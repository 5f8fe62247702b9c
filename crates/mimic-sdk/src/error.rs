//! Error types shared by mock bodies and the dispatch core

use std::sync::Arc;

/// Result type for every bridge and mock-method operation
pub type MockResult<T> = Result<T, MockError>;

/// Which instance table an index was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceScope {
    /// Instances registered once during bootstrap
    Startup,
    /// Instances registered by the running test
    PerTest,
}

impl std::fmt::Display for InstanceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceScope::Startup => write!(f, "startup"),
            InstanceScope::PerTest => write!(f, "per-test"),
        }
    }
}

/// Mock dispatch error types
///
/// `Raised` carries a failure produced by a mock body. The bridge hands it
/// back exactly as the mock returned it; the other variants come from the
/// collaborators the bridge consults (class table, instance tables, ...).
#[derive(Debug, Clone, thiserror::Error)]
pub enum MockError {
    /// Failure raised by the mock implementation itself
    #[error(transparent)]
    Raised(Arc<dyn std::error::Error + Send + Sync>),

    /// No class registered under the given canonical name
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// Class exists but declares no no-argument constructor
    #[error("No no-argument constructor on {0}")]
    NoConstructor(String),

    /// Instance index outside the registered range
    #[error("No {scope} mock instance at index {index} (registered: {len})")]
    InstanceIndexOutOfRange {
        /// Table that was consulted
        scope: InstanceScope,
        /// Requested index
        index: usize,
        /// Number of registered instances
        len: usize,
    },

    /// A named type in a descriptor could not be resolved
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// Descriptor string is not well formed
    #[error("Invalid descriptor {descriptor:?}: {reason}")]
    InvalidDescriptor {
        /// Offending descriptor
        descriptor: String,
        /// What went wrong
        reason: String,
    },

    /// No method with the given name and signature on the class hierarchy
    #[error("Method not found: {class}.{name}{descriptor}")]
    MethodNotFound {
        /// Canonical class name the lookup started from
        class: String,
        /// Method name
        name: String,
        /// Parameter descriptor that was searched for
        descriptor: String,
    },

    /// Argument count does not match the method's parameter count
    #[error("Argument count mismatch: expected {expected}, got {got}")]
    ArgumentCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Fixed-layout call record failed validation
    #[error("Invalid call record: {0}")]
    InvalidCallRecord(String),
}

impl MockError {
    /// Wrap a mock body's own failure
    pub fn raised<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MockError::Raised(Arc::new(error))
    }

    /// Raise a plain message from a mock body
    pub fn raise(message: impl Into<String>) -> Self {
        MockError::Raised(Arc::new(RaisedMessage(message.into())))
    }

    /// Check if this failure came from a mock body
    pub fn is_raised(&self) -> bool {
        matches!(self, MockError::Raised(_))
    }
}

/// Message-only failure used by [`MockError::raise`]
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RaisedMessage(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_raised_is_transparent() {
        let err = MockError::raised(Boom);
        assert!(err.is_raised());
        assert_eq!(err.to_string(), "boom");

        let err = MockError::raise("not today");
        assert_eq!(err.to_string(), "not today");
    }

    #[test]
    fn test_out_of_range_message() {
        let err = MockError::InstanceIndexOutOfRange {
            scope: InstanceScope::Startup,
            index: 3,
            len: 1,
        };
        assert_eq!(
            err.to_string(),
            "No startup mock instance at index 3 (registered: 1)"
        );
    }
}
