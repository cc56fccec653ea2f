//! Bearer credential issued by the backend at login.
//!
//! The credential is opaque to the client except for one thing: it is a JWT,
//! and its payload segment carries the identity the backend signed, including
//! the account role. The client never verifies the signature (it has no key);
//! it only reads the claims the backend itself put there.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::types::status::Role;

/// Errors decoding the claims of a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential is not a three-part token")]
    Malformed,
    #[error("credential payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("credential payload is not JSON claims: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Opaque bearer credential.
///
/// `Debug` is redacted by `SecretString`.
#[derive(Debug, Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header and for persistence.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }

    /// Decode the (unverified) claims in the token payload.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the token is not a JWT or its payload
    /// is not a JSON object.
    pub fn claims(&self) -> Result<TokenClaims, CredentialError> {
        let mut segments = self.expose().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CredentialError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// The subset of JWT claims the client reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Role as a top-level claim.
    #[serde(default)]
    pub role: Option<String>,
    /// Subject; some backends put the whole identity object here.
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    /// Identity object under the older claim name.
    #[serde(default)]
    pub identity: Option<serde_json::Value>,
}

impl TokenClaims {
    /// The role the backend signed into the token, if any.
    ///
    /// Looks at a top-level `role` claim first, then at `sub.role` (or
    /// `identity.role`) for identity-object tokens. Unknown role names yield
    /// `None`.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        let raw = self
            .role
            .as_deref()
            .or_else(|| self.identity_field("role"))?;
        raw.parse().ok()
    }

    /// Username from an identity-object subject.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.identity_field("username")
    }

    fn identity_field(&self, key: &str) -> Option<&str> {
        [&self.sub, &self.identity]
            .into_iter()
            .flatten()
            .find_map(|object| object.get(key).and_then(serde_json::Value::as_str))
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether the token has expired at `now`. Tokens without `exp` never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}
