// src/models/user.rs
// DOCUMENTATION: Authentication data structures
// PURPOSE: Users, sessions and the login/register wire formats

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::string_id;

/// Authenticated user record
/// DOCUMENTATION: Persisted as JSON under the user storage key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user id (numeric ids are stored as strings)
    #[serde(deserialize_with = "string_id")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Login email
    #[serde(default)]
    pub email: String,
}

/// Token + user pairing held by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    pub user: User,
}

/// Response body of /auth/login and /auth/register
/// DOCUMENTATION: Some backend builds answer with `access_token` + `token_type`,
/// others with a bare `token`; both are accepted
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "access_token")]
    pub token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    pub user: User,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session {
            token: response.token,
            user: response.user,
        }
    }
}

/// Request body of POST /auth/login
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body of POST /auth/register
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "validate_name")]
    pub name: String,

    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

impl RegisterRequest {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

/// Names need two visible characters
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < 2 {
        let mut err = ValidationError::new("name_too_short");
        err.message = Some("name must be at least 2 characters".into());
        return Err(err);
    }
    Ok(())
}
