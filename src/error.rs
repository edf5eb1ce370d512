//! Error types for schema construction and validation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema is empty")]
    EmptySchema,

    #[error("Object is empty")]
    EmptyObject,

    /// Raised once per `validate` call with every collected failure,
    /// each formatted as `"path: message"`.
    #[error("Validation failed")]
    ValidationFailed { failures: Vec<String> },

    #[error("Invalid schema definition at {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    #[error("Unknown validator at {path}: {name}")]
    UnknownValidator { path: String, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// The `"path: message"` failures of a failed validation, empty for
    /// every other kind of error
    pub fn failures(&self) -> &[String] {
        match self {
            SchemaError::ValidationFailed { failures } => failures,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        assert_eq!(SchemaError::EmptySchema.to_string(), "Schema is empty");
        assert_eq!(SchemaError::EmptyObject.to_string(), "Object is empty");
        assert!(SchemaError::EmptyObject.failures().is_empty());
    }

    #[test]
    fn test_failures_accessor() {
        let err = SchemaError::ValidationFailed {
            failures: vec!["/name: missing value".to_string()],
        };
        assert_eq!(err.to_string(), "Validation failed");
        assert_eq!(err.failures(), ["/name: missing value".to_string()]);
    }
}
