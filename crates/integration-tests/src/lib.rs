//! Integration test harness for Green Street Market.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p green-street-integration-tests
//! ```
//!
//! # Mock backend
//!
//! [`MockBackend`] serves the backend's JSON API from an in-process `axum`
//! router bound to an ephemeral port. It issues tokens shaped like the real
//! backend's (the identity object sits in the `sub` claim) and lets tests
//! seed data and inject failures.
//!
//! ```rust,ignore
//! let backend = MockBackend::spawn().await;
//! backend.add_user("ada", "secret", Role::Seller);
//! let client = backend.client();
//! ```

mod routes;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use green_street_core::Role;
use green_street_storefront::api::ApiClient;
use green_street_storefront::config::ClientConfig;

/// Shape of the product listing served on `GET /api/products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingShape {
    /// `{"products": [...]}`
    #[default]
    Wrapped,
    /// `[...]`
    Bare,
    /// `{"message": "..."}` with no listing
    Garbage,
}

#[derive(Debug, Clone)]
pub(crate) struct MockUser {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub users: Vec<MockUser>,
    pub admins: Vec<MockUser>,
    pub products: Vec<Value>,
    pub recycle_items: Vec<Value>,
    pub vouchers: Vec<(i32, Value)>,
    pub eco_points: i64,
    pub next_id: i32,
    pub echo_role: bool,
    pub omit_role: bool,
    pub revoked: bool,
    pub fail_product_saves: bool,
    pub listing: ListingShape,
    pub listing_hits: usize,
    pub eco_score_calls: usize,
}

impl MockState {
    pub(crate) fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

pub(crate) type SharedState = Arc<Mutex<MockState>>;

pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the backend.
pub struct MockBackend {
    base_url: String,
    state: SharedState,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn spawn() -> Self {
        let state = SharedState::default();
        let router = routes::router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always valid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_base_url(&self.base_url).expect("Mock backend URL is valid")
    }

    /// A fresh API client for this backend (own product cache).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("Failed to build API client")
    }

    /// Register a customer or seller account. Returns its id.
    pub fn add_user(&self, username: &str, password: &str, role: Role) -> i32 {
        let mut state = lock(&self.state);
        let id = state.next_id();
        state.users.push(MockUser {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role,
        });
        id
    }

    /// Register an admin account.
    pub fn add_admin(&self, username: &str, password: &str) {
        let mut state = lock(&self.state);
        let id = state.next_id();
        state.admins.push(MockUser {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        });
    }

    /// List a product. Returns its id.
    pub fn add_product(&self, name: &str, price: f64, eco_score: Option<i32>) -> i32 {
        let mut state = lock(&self.state);
        let id = state.next_id();
        state.products.push(json!({
            "id": id,
            "name": name,
            "price": price,
            "eco_score": eco_score,
        }));
        id
    }

    /// Add a raw, possibly malformed, listing entry.
    pub fn add_raw_product(&self, entry: Value) {
        lock(&self.state).products.push(entry);
    }

    /// Echo the account role in login responses.
    pub fn set_echo_role(&self, echo: bool) {
        lock(&self.state).echo_role = echo;
    }

    /// Issue tokens without any role claim.
    pub fn set_omit_role(&self, omit: bool) {
        lock(&self.state).omit_role = omit;
    }

    /// Refuse every token from now on.
    pub fn revoke_tokens(&self) {
        lock(&self.state).revoked = true;
    }

    /// Make product create/update fail with a server error.
    pub fn set_fail_product_saves(&self, fail: bool) {
        lock(&self.state).fail_product_saves = fail;
    }

    pub fn set_listing(&self, shape: ListingShape) {
        lock(&self.state).listing = shape;
    }

    pub fn set_eco_points(&self, points: i64) {
        lock(&self.state).eco_points = points;
    }

    /// How many times the public listing was served.
    #[must_use]
    pub fn listing_hits(&self) -> usize {
        lock(&self.state).listing_hits
    }

    /// How many eco score calculations were requested.
    #[must_use]
    pub fn eco_score_calls(&self) -> usize {
        lock(&self.state).eco_score_calls
    }

    /// Names of the products currently listed.
    #[must_use]
    pub fn product_names(&self) -> Vec<String> {
        lock(&self.state)
            .products
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Status of a recycle submission.
    #[must_use]
    pub fn recycle_status(&self, id: i32) -> Option<String> {
        lock(&self.state)
            .recycle_items
            .iter()
            .find(|item| item.get("id").and_then(Value::as_i64) == Some(i64::from(id)))
            .and_then(|item| item.get("status").and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Build a token in the backend's format with the given claims.
#[must_use]
pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock-signature")
}

/// Token for an identity, expiring `ttl_secs` from now (negative for past).
#[must_use]
pub fn token_for(username: &str, id: i32, role: Role, ttl_secs: i64) -> String {
    token_with_claims(&json!({
        "sub": {"username": username, "id": id, "role": role.as_str()},
        "exp": unix_now() + ttl_secs,
    }))
}

/// Decode the identity claim of a token issued by [`token_for`].
pub(crate) fn identity_of(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("sub").cloned()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// A fresh state file path under the system temp directory.
#[must_use]
pub fn temp_state_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("green-street-it-{}", uuid::Uuid::new_v4()))
        .join("state.json")
}
