//! Directory query error types
//!
//! Every error is raised synchronously where it is detected: at construction,
//! during resolution, during serialization or during hydration. Nothing here is
//! transient, so there is no retry classification.

use thiserror::Error;

/// Error that can occur while compiling filters or hydrating entries.
#[derive(Debug, Error)]
pub enum QueryError {
    // Filter construction / serialization
    /// The filter is structurally invalid (bad composite symbol, NOT arity,
    /// reserved characters in an attribute name, empty composite).
    #[error("query syntax error: {message}")]
    QuerySyntax { message: String },

    /// A constructor received malformed input.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    // Converter registry
    /// No converter is registered under the given name.
    #[error("unknown converter '{name}'")]
    ConverterNotFound { name: String },

    /// A converter is already registered under the given name.
    #[error("converter '{name}' is already registered")]
    ConverterAlreadyRegistered { name: String },

    /// The registration does not satisfy the converter contract.
    #[error("invalid converter '{name}': {message}")]
    InvalidConverter { name: String, message: String },

    /// A converter rejected the value it was given.
    #[error("converter '{converter}' failed: {message}")]
    ConversionFailed { converter: String, message: String },

    // Schema
    /// Strict schema mode rejected an attribute with no mapping.
    #[error("attribute '{attribute}' is not mapped in schema '{schema}'")]
    UnmappedAttribute { attribute: String, schema: String },

    // Configuration
    /// Query configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl QueryError {
    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::QuerySyntax { .. } => "QUERY_SYNTAX",
            QueryError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            QueryError::ConverterNotFound { .. } => "UNKNOWN_CONVERTER",
            QueryError::ConverterAlreadyRegistered { .. } => "CONVERTER_ALREADY_REGISTERED",
            QueryError::InvalidConverter { .. } => "INVALID_CONVERTER",
            QueryError::ConversionFailed { .. } => "CONVERSION_FAILED",
            QueryError::UnmappedAttribute { .. } => "UNMAPPED_ATTRIBUTE",
            QueryError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    /// Check if this error came from registering a converter.
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            QueryError::ConverterAlreadyRegistered { .. } | QueryError::InvalidConverter { .. }
        )
    }

    // Convenience constructors

    /// Create a query syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        QueryError::QuerySyntax {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a conversion failure for the named converter.
    pub fn conversion(converter: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::ConversionFailed {
            converter: converter.into(),
            message: message.into(),
        }
    }

    /// Create an unknown converter error.
    pub fn converter_not_found(name: impl Into<String>) -> Self {
        QueryError::ConverterNotFound { name: name.into() }
    }
}

/// Result type for directory query operations.
pub type QueryResult<T> = Result<T, QueryError>;
