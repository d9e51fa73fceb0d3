use crate::validator::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the outreach-gen library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// The lead table lacks one or more required columns.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Every required column absent from the header row
        columns: Vec<String>,
    },

    /// A kept lead row has an empty or unusable required field.
    #[error("Row {row}: required field '{field}' is empty or invalid")]
    InvalidLead {
        /// 1-based row number, counting the header as row 1
        row: usize,
        /// Name of the empty or invalid column
        field: String,
    },

    /// CSV reading or writing error.
    #[error("CSV error: {message}")]
    Csv {
        /// Error message
        message: String,
    },

    /// The generation backend could not be reached or answered with an error.
    #[error("Generation backend error: {message}")]
    Backend {
        /// Error message
        message: String,
    },

    /// The backend answered, but not with a usable message pack.
    #[error("Malformed backend response: {message}")]
    MalformedResponse {
        /// Error message
        message: String,
    },

    /// A message pack failed content validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Every generation attempt for a lead failed.
    #[error("Generation failed for '{email}' after {attempts} attempt(s): {reason}")]
    Generation {
        /// Lead identity
        email: String,
        /// Number of attempts made
        attempts: usize,
        /// Error of the final attempt
        reason: String,
    },

    /// A lead reached the exporter without a message pack.
    #[error("No message pack generated for '{email}'")]
    MissingPack {
        /// Lead identity
        email: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// JSON or YAML serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a generation error for a lead whose attempts were exhausted.
    #[must_use]
    pub fn generation(email: impl Into<String>, attempts: usize, last: &Self) -> Self {
        Self::Generation {
            email: email.into(),
            attempts,
            reason: last.to_string(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this error aborts a run before any lead is processed.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::MissingColumns { .. } | Self::InvalidLead { .. }
        )
    }

    /// Returns true if this is a generation error.
    #[must_use]
    pub const fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Csv {
            message: e.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::Template {
            template: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/leads.csv", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/leads.csv"));
    }

    #[test]
    fn test_missing_columns_lists_every_column() {
        let err = Error::MissingColumns {
            columns: vec!["stage".to_string(), "email".to_string()],
        };
        assert!(err.is_config());
        assert_eq!(err.to_string(), "Missing required columns: stage, email");
    }

    #[test]
    fn test_generation_error_keeps_last_reason() {
        let last = Error::from(ValidationError::NonAscii { ch: 'é' });
        let err = Error::generation("a@x.com", 3, &last);

        assert!(err.is_generation());
        let text = err.to_string();
        assert!(text.contains("a@x.com"));
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("non-ASCII"));
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::backend("timeout");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
