//! Session state and the authentication state machine.
//!
//! Two states: [`SessionState::Anonymous`] (initial) and
//! [`SessionState::Authenticated`]. Only the credential is persisted; the
//! role lives in memory and is set from what the backend reports at login,
//! never from the role the user picked on the login form.
//!
//! Every transition bumps an epoch. Callers take a [`Ticket`] before a
//! network call and hand it back with the result; results carrying a stale
//! ticket are dropped, so a response that lands after a logout (or after a
//! newer login) cannot resurrect or clobber the session.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use green_street_core::{Credential, CredentialError, Role};

use crate::store::{SharedStore, keys};

/// Errors from session transitions.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend response carried no role, neither echoed nor in the token.
    #[error("login response did not include an account role")]
    MissingRole,

    /// The credential could not be decoded.
    #[error("credential is invalid: {0}")]
    InvalidCredential(#[from] CredentialError),

    /// The credential's expiry has passed.
    #[error("credential has expired")]
    Expired,

    /// The session changed while the request was in flight.
    #[error("session changed while the request was in flight")]
    Stale,
}

/// In-memory session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { role: Role },
}

impl SessionState {
    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Role of the logged-in user. `None` while anonymous.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { role } => Some(*role),
        }
    }
}

/// Proof of which session a request was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Session owner: state, credential, and the store they persist to.
pub struct Session {
    state: SessionState,
    credential: Option<Credential>,
    epoch: u64,
    store: SharedStore,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("has_credential", &self.credential.is_some())
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start anonymous, picking up any persisted credential.
    ///
    /// The credential alone does not authenticate; see [`Session::restore`].
    #[must_use]
    pub fn initialize(store: SharedStore) -> Self {
        let credential = match store.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()).map(Credential::new),
            Err(e) => {
                warn!(error = %e, "Credential store unavailable");
                None
            }
        };
        Self {
            state: SessionState::Anonymous,
            credential,
            epoch: 0,
            store,
        }
    }

    /// Rebuild `Authenticated(role)` from the persisted credential.
    ///
    /// Succeeds only for an unexpired credential whose claims carry a role.
    /// Anything else clears the credential and stays anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` describing why the credential was discarded.
    pub fn restore(&mut self) -> Result<Option<Role>, AuthError> {
        let Some(credential) = self.credential.clone() else {
            return Ok(None);
        };

        let outcome = credential.claims().map_err(AuthError::from).and_then(|claims| {
            if claims.is_expired_at(Utc::now()) {
                return Err(AuthError::Expired);
            }
            claims.role().ok_or(AuthError::MissingRole)
        });

        match outcome {
            Ok(role) => {
                self.transition(SessionState::Authenticated { role });
                debug!(%role, "Session restored");
                Ok(Some(role))
            }
            Err(e) => {
                warn!(error = %e, "Discarding persisted credential");
                self.clear();
                Err(e)
            }
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Role of the logged-in user.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.state.role()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// The bearer credential, if one is held.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Ticket for a request issued now.
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        Ticket(self.epoch)
    }

    /// Whether no transition happened since `ticket` was taken.
    #[must_use]
    pub const fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.epoch
    }

    /// Apply a successful login response.
    ///
    /// The role comes from the backend: the echoed `role` field if present,
    /// otherwise the role claim inside the credential. `requested` (the form
    /// selection) is only compared against it for logging.
    ///
    /// # Errors
    ///
    /// - `AuthError::Stale` if the session changed since `ticket`
    /// - `AuthError::MissingRole` if the backend reported no role; nothing
    ///   is persisted in that case
    pub fn complete_login(
        &mut self,
        ticket: Ticket,
        credential: Credential,
        echoed_role: Option<Role>,
        requested: Option<Role>,
    ) -> Result<Role, AuthError> {
        if !self.is_current(ticket) {
            return Err(AuthError::Stale);
        }

        let role = authoritative_role(&credential, echoed_role)?;
        if let Some(requested) = requested
            && requested != role
        {
            warn!(%requested, %role, "Backend role differs from the role selected at login");
        }

        if let Err(e) = self.store.set(keys::TOKEN, credential.expose()) {
            warn!(error = %e, "Failed to persist credential");
        }
        self.credential = Some(credential);
        self.transition(SessionState::Authenticated { role });
        info!(%role, "Logged in");
        Ok(role)
    }

    /// Explicit logout: drop the role and the persisted credential.
    pub fn logout(&mut self) {
        self.clear();
        info!("Logged out");
    }

    /// The backend rejected the credential issued under `ticket`.
    ///
    /// Forces the anonymous state unless the session has moved on since the
    /// request was issued. Returns whether the session was cleared.
    pub fn reject_credential(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            debug!("Ignoring credential rejection from a superseded session");
            return false;
        }
        warn!("Credential rejected by backend, clearing session");
        self.clear();
        true
    }

    /// Registration never authenticates: return to anonymous.
    pub fn registered(&mut self) {
        if self.is_authenticated() || self.credential.is_some() {
            self.clear();
        }
    }

    fn clear(&mut self) {
        if let Err(e) = self.store.remove(keys::TOKEN) {
            warn!(error = %e, "Failed to remove persisted credential");
        }
        self.credential = None;
        self.transition(SessionState::Anonymous);
    }

    fn transition(&mut self, next: SessionState) {
        self.state = next;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

/// Resolve the backend's role for a fresh credential.
fn authoritative_role(credential: &Credential, echoed: Option<Role>) -> Result<Role, AuthError> {
    if let Some(role) = echoed {
        return Ok(role);
    }
    match credential.claims() {
        Ok(claims) => claims.role().ok_or(AuthError::MissingRole),
        Err(e) => {
            debug!(error = %e, "Credential carries no readable claims");
            Err(AuthError::MissingRole)
        }
    }
}
