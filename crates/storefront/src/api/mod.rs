//! Backend API client.
//!
//! # Architecture
//!
//! - JSON over HTTP with `reqwest` 0.13, one shared connection pool
//! - The backend is the source of truth; nothing is synced locally
//! - The public product listing is cached via `moka` (5 minute TTL)
//! - Responses are validated into `green_street_core` types at this
//!   boundary; malformed records never reach the rest of the crate
//!
//! # Example
//!
//! ```rust,ignore
//! use green_street_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//! let products = client.products().await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{LoginForm, LoginGrant, RegisterForm};

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend refused the credential (401/422 on an authenticated call).
    #[error("Credential rejected: {0}")]
    Unauthorized(String),

    /// The backend answered with an error status.
    #[error("Request failed with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// A multi-step operation failed after an earlier step succeeded.
    #[error("{failed} failed after {completed} succeeded: {source}")]
    PartialFailure {
        completed: &'static str,
        failed: &'static str,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Whether the backend rejected the credential, looking through partial
    /// failures.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::PartialFailure { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Single human-readable message for display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            Self::Rejected { message, .. } => message.clone(),
            Self::Decode(_) | Self::Endpoint(_) => {
                "The server sent an unexpected response.".to_string()
            }
            Self::PartialFailure {
                completed,
                failed,
                source,
            } => format!(
                "The {completed} succeeded, but the {failed} failed: {}",
                source.user_message()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_seen_through_partial_failure() {
        let err = ApiError::PartialFailure {
            completed: "eco score calculation",
            failed: "product save",
            source: Box::new(ApiError::Unauthorized("Token has expired".to_string())),
        };
        assert!(err.is_unauthorized());
        assert!(
            !ApiError::Rejected {
                status: 400,
                message: "User already exists!".to_string()
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn test_user_messages() {
        let rejected = ApiError::Rejected {
            status: 401,
            message: "Invalid credentials!".to_string(),
        };
        assert_eq!(rejected.user_message(), "Invalid credentials!");

        let partial = ApiError::PartialFailure {
            completed: "eco score calculation",
            failed: "product save",
            source: Box::new(ApiError::Rejected {
                status: 500,
                message: "Database unavailable".to_string(),
            }),
        };
        assert_eq!(
            partial.user_message(),
            "The eco score calculation succeeded, but the product save failed: Database unavailable"
        );
    }
}
