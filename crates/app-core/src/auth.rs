//! Authentication backend contract
//!
//! The registration flow talks to the backend through [`AuthApi`]. The
//! transport lives elsewhere; this module only fixes the calls the flow
//! needs and the shapes of their inputs and outputs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication backend error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Backend rejected the request with a message
    #[error("{0}")]
    Rejected(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with something unexpected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Registration request sent to the backend
///
/// Produced only from a valid registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// First name, capitalized
    pub name: String,
    /// Last name, capitalized
    pub surname: String,
    /// Nickname
    pub nickname: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Credentials returned by a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Session token
    pub token: String,
}

/// Backend calls used by the registration flow
///
/// # Example
///
/// ```rust
/// use app_core::auth::{AuthApi, Credentials, RegistrationRequest, Result};
/// use async_trait::async_trait;
///
/// struct OfflineApi;
///
/// #[async_trait]
/// impl AuthApi for OfflineApi {
///     async fn check_nickname_available(&self, nickname: &str) -> Result<bool> {
///         Ok(nickname != "admin")
///     }
///
///     async fn check_email_available(&self, _email: &str) -> Result<bool> {
///         Ok(true)
///     }
///
///     async fn register(&self, request: RegistrationRequest) -> Result<Credentials> {
///         Ok(Credentials {
///             name: request.name,
///             email: request.email,
///             token: "offline".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Check whether a nickname is still free
    async fn check_nickname_available(&self, nickname: &str) -> Result<bool>;

    /// Check whether an email address is still free
    async fn check_email_available(&self, email: &str) -> Result<bool>;

    /// Create an account
    async fn register(&self, request: RegistrationRequest) -> Result<Credentials>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = AuthError::Rejected("Nickname contains forbidden words".to_string());
        assert_eq!(err.to_string(), "Nickname contains forbidden words");
    }

    #[test]
    fn test_network_error_display() {
        let err = AuthError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "Network error: connection reset");
    }

    #[test]
    fn test_request_serialization() {
        let request = RegistrationRequest {
            name: "Ann".to_string(),
            surname: "Lee".to_string(),
            nickname: "annlee".to_string(),
            email: "ann@example.com".to_string(),
            password: "secret123".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["nickname"], "annlee");
        assert_eq!(json["email"], "ann@example.com");
    }
}
