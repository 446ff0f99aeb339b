//! Typed error handling for the transit service
//!
//! Handlers return [`TransitError`], which maps every failure to an HTTP
//! status and a stable error code.
//!
//! # Error Categories
//!
//! - [`QueryError`]: Errors raised while planning a listing query
//! - [`EntityError`]: Errors related to entity operations (CRUD)
//! - [`ValidationError`]: Errors related to input validation
//! - [`RequestError`]: Errors related to the HTTP request itself
//! - [`ConfigError`]: Errors related to configuration parsing and validation
//! - [`StorageError`]: Errors related to persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use transit::prelude::*;
//!
//! async fn get_city(id: i64) -> Result<City, TransitError> {
//!     service.get(id).await?.ok_or(TransitError::Entity(EntityError::NotFound {
//!         entity_type: "city".to_string(),
//!         id,
//!     }))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the transit service
#[derive(Debug)]
pub enum TransitError {
    /// Listing query errors (sort parsing)
    Query(QueryError),

    /// Entity-related errors (CRUD operations)
    Entity(EntityError),

    /// Validation errors
    Validation(ValidationError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Configuration errors
    Config(ConfigError),

    /// Storage errors
    Storage(StorageError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for TransitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitError::Query(e) => write!(f, "{}", e),
            TransitError::Entity(e) => write!(f, "{}", e),
            TransitError::Validation(e) => write!(f, "{}", e),
            TransitError::Request(e) => write!(f, "{}", e),
            TransitError::Config(e) => write!(f, "{}", e),
            TransitError::Storage(e) => write!(f, "{}", e),
            TransitError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for TransitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransitError::Query(e) => Some(e),
            TransitError::Entity(e) => Some(e),
            TransitError::Validation(e) => Some(e),
            TransitError::Request(e) => Some(e),
            TransitError::Config(e) => Some(e),
            TransitError::Storage(e) => Some(e),
            TransitError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TransitError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransitError::Query(_) => StatusCode::BAD_REQUEST,
            TransitError::Entity(e) => e.status_code(),
            TransitError::Validation(_) => StatusCode::BAD_REQUEST,
            TransitError::Request(e) => e.status_code(),
            TransitError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TransitError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TransitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            TransitError::Query(e) => e.error_code(),
            TransitError::Entity(e) => e.error_code(),
            TransitError::Validation(_) => "VALIDATION_ERROR",
            TransitError::Request(e) => e.error_code(),
            TransitError::Config(_) => "CONFIG_ERROR",
            TransitError::Storage(_) => "STORAGE_ERROR",
            TransitError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            TransitError::Query(QueryError::InvalidSortExpression { expression, reason }) => {
                Some(serde_json::json!({
                    "sort": expression,
                    "reason": reason
                }))
            }
            TransitError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            TransitError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for TransitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while planning a listing query
///
/// Only the sort expression is parsed strictly; field lists and page
/// coordinates are normalized instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Sort expression names a field outside the output or is malformed
    #[error("Invalid sorting string '{expression}': {reason}")]
    InvalidSortExpression { expression: String, reason: String },
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidSortExpression { .. } => "InvalidSortExpression",
        }
    }
}

impl From<QueryError> for TransitError {
    fn from(err: QueryError) -> Self {
        TransitError::Query(err)
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity operations
#[derive(Debug)]
pub enum EntityError {
    /// Entity was not found
    NotFound { entity_type: String, id: i64 },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
        }
    }
}

impl From<EntityError> for TransitError {
    fn from(err: EntityError) -> Self {
        TransitError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Invalid JSON format
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for TransitError {
    fn from(err: ValidationError) -> Self {
        TransitError::Validation(err)
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors(None, &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

/// Flatten nested struct and list errors into dotted field paths
fn collect_field_errors(
    prefix: Option<&str>,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldValidationError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|err| FieldValidationError {
                    field: path.clone(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(Some(&format!("{}[{}]", path, index)), inner, out);
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for TransitError {
    fn from(errors: validator::ValidationErrors) -> Self {
        TransitError::Validation(errors.into())
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Invalid entity ID format
    InvalidEntityId { id: String },

    /// Unauthorized request
    Unauthorized { message: String },

    /// Forbidden operation
    Forbidden { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidEntityId { id } => {
                write!(f, "Invalid entity ID format: '{}'", id)
            }
            RequestError::Unauthorized { message } => {
                write!(f, "Unauthorized: {}", message)
            }
            RequestError::Forbidden { message } => {
                write!(f, "Forbidden: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidEntityId { .. } => StatusCode::BAD_REQUEST,
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidEntityId { .. } => "INVALID_ENTITY_ID",
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

impl From<RequestError> for TransitError {
    fn from(err: RequestError) -> Self {
        TransitError::Request(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for TransitError {
    fn from(err: ConfigError) -> Self {
        TransitError::Config(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to persistence
#[derive(Debug)]
pub enum StorageError {
    /// A store operation failed
    OperationFailed { operation: String, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::OperationFailed { operation, message } => {
                write!(f, "Storage {} failed: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    /// Wrap a collaborator failure for one operation
    pub fn wrap(operation: &str, err: anyhow::Error) -> Self {
        StorageError::OperationFailed {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for TransitError {
    fn from(err: StorageError) -> Self {
        TransitError::Storage(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for TransitError {
    fn from(err: serde_json::Error) -> Self {
        TransitError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for TransitError {
    fn from(err: std::io::Error) -> Self {
        TransitError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for TransitError {
    fn from(err: serde_yaml::Error) -> Self {
        TransitError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<anyhow::Error> for TransitError {
    fn from(err: anyhow::Error) -> Self {
        TransitError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for transit operations
pub type TransitResult<T> = Result<T, TransitError>;

// =============================================================================
// Tests
// =============================================================================
