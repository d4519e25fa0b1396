// src/errors.rs
// DOCUMENTATION: Custom error types for the API client
// PURPOSE: Centralized error handling for requests, sessions and storage

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Client-specific error types
/// DOCUMENTATION: One variant per failure kind
/// Callers (UI layers, the CLI) decide how to present each of them
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {}", detail_or_reason(.status, .body))]
    Http { status: StatusCode, body: Value },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: StatusCode, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } | ClientError::Auth { status, .. } => Some(*status),
            ClientError::Conflict(_) => Some(StatusCode::CONFLICT),
            _ => None,
        }
    }

    /// True for a 401 response
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Backend `detail` message from an HTTP error body
    /// DOCUMENTATION: The backend reports errors as {"detail": "..."};
    /// validation failures send a list of objects with a `msg` field instead
    pub fn detail(&self) -> Option<String> {
        match self {
            ClientError::Http { body, .. } => extract_detail(body),
            _ => None,
        }
    }
}

/// Storage backend failure
/// DOCUMENTATION: Raised by SessionStore implementations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted store: {0}")]
    Corrupted(String),
}

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub(crate) fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

fn detail_or_reason(status: &StatusCode, body: &Value) -> String {
    extract_detail(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_string() {
        let err = ClientError::Http {
            status: StatusCode::BAD_REQUEST,
            body: json!({"detail": "Email already registered"}),
        };
        assert_eq!(err.detail(), Some("Email already registered".to_string()));
        assert_eq!(err.to_string(), "HTTP error 400 Bad Request: Email already registered");
    }

    #[test]
    fn test_detail_validation_list() {
        let body = json!({"detail": [{"msg": "field required"}, {"msg": "not an email"}]});
        assert_eq!(
            extract_detail(&body),
            Some("field required; not an email".to_string())
        );
    }

    #[test]
    fn test_display_without_body() {
        let err = ClientError::Http {
            status: StatusCode::NOT_FOUND,
            body: Value::Null,
        };
        assert_eq!(err.to_string(), "HTTP error 404 Not Found: Not Found");
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_is_unauthorized() {
        let err = ClientError::Http {
            status: StatusCode::UNAUTHORIZED,
            body: Value::Null,
        };
        assert!(err.is_unauthorized());
        assert!(!ClientError::Network("timeout".into()).is_unauthorized());
        assert_eq!(
            ClientError::Conflict("dup".into()).status(),
            Some(StatusCode::CONFLICT)
        );
    }
}
