//! Unified error handling with Sentry integration.
//!
//! Every fallible operation of the [`App`](crate::app::App) shell returns
//! `Result<T, AppError>`. Each error maps to exactly one human-readable
//! message via [`AppError::user_message`]; the `Display` form is the
//! diagnostic one.

use thiserror::Error;

use green_street_core::Role;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::store::StoreError;

/// Application-level error type for the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session transition failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Persistent store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The operation needs a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The operation needs a different role.
    #[error("Forbidden: requires {required}")]
    Forbidden { required: Role },

    /// Invalid input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the backend refused the session's credential.
    #[must_use]
    pub fn is_credential_rejection(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_unauthorized())
    }

    /// The single message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Auth(AuthError::MissingRole) => {
                "Login failed: the server did not report an account role.".to_string()
            }
            Self::Auth(AuthError::Expired | AuthError::InvalidCredential(_)) => {
                "Your session has expired. Please log in again.".to_string()
            }
            Self::Auth(AuthError::Stale) => {
                "Your session changed while this was loading. Please try again.".to_string()
            }
            Self::Store(_) => "Could not save your data on this device.".to_string(),
            Self::Config(e) => e.to_string(),
            Self::NotLoggedIn => "Please log in to continue.".to_string(),
            Self::Forbidden { required } => {
                format!("This is only available to {required} accounts.")
            }
            Self::BadRequest(message) => message.clone(),
        }
    }

    /// Report unexpected failures to Sentry.
    ///
    /// User mistakes and refused credentials are not reported.
    pub fn report(&self) {
        let unexpected = match self {
            Self::Api(ApiError::Rejected { status, .. }) => *status >= 500,
            Self::Api(ApiError::Unauthorized(_)) => false,
            Self::Api(ApiError::PartialFailure { source, .. }) => !source.is_unauthorized(),
            Self::Api(_) | Self::Store(_) | Self::Auth(AuthError::MissingRole) => true,
            _ => false,
        };
        if unexpected {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a login.
pub fn set_sentry_user(username: &str, role: Role) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
        scope.set_tag("role", role.as_str());
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
        scope.remove_tag("role");
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("Shipping address is required".to_string());
        assert_eq!(err.to_string(), "Bad request: Shipping address is required");

        let err = AppError::Forbidden {
            required: Role::Seller,
        };
        assert_eq!(err.to_string(), "Forbidden: requires seller");
    }

    #[test]
    fn test_one_message_per_failure() {
        let err = AppError::from(ApiError::Rejected {
            status: 401,
            message: "Invalid credentials!".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid credentials!");
        assert!(!err.is_credential_rejection());

        let err = AppError::from(AuthError::MissingRole);
        assert_eq!(
            err.user_message(),
            "Login failed: the server did not report an account role."
        );
        assert_eq!(
            AppError::NotLoggedIn.user_message(),
            "Please log in to continue."
        );
    }

    #[test]
    fn test_credential_rejection() {
        let err = AppError::from(ApiError::Unauthorized("Token has expired".to_string()));
        assert!(err.is_credential_rejection());
        assert_eq!(
            err.user_message(),
            "Your session has expired. Please log in again."
        );
        assert!(!AppError::NotLoggedIn.is_credential_rejection());
    }
}
