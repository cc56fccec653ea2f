//! Application shell.
//!
//! [`App`] owns the [`Cart`] and the [`Session`] over one injected store and
//! is the only place where views, the API client and the state machines
//! meet. Every user action goes through here so that breadcrumbs, Sentry
//! user context and credential rejection are handled in one spot.

use green_street_core::{CartItem, Credential, Price, Role, UserProfile};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError, LoginForm, LoginGrant, RegisterForm};
use crate::cart::Cart;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::router::{Navigation, Route, gate, landing};
use crate::session::{Session, SessionState, Ticket};
use crate::store::SharedStore;

/// Outcome of a simulated checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub items: Vec<CartItem>,
    pub total: Price,
    pub address: String,
}

impl Receipt {
    /// Total with two decimals.
    #[must_use]
    pub fn total_display(&self) -> String {
        self.total.display()
    }
}

/// The client application.
#[derive(Debug)]
pub struct App {
    cart: Cart,
    session: Session,
}

impl App {
    /// Hydrate cart and session from `store`.
    ///
    /// The session starts anonymous even if a credential is persisted; call
    /// [`App::restore`] to resume it.
    #[must_use]
    pub fn start(store: SharedStore) -> Self {
        let cart = Cart::initialize(store.clone());
        let session = Session::initialize(store);
        Self { cart, session }
    }

    /// Resume the session from the persisted credential, if it is usable.
    pub fn restore(&mut self) -> Option<Role> {
        match self.session.restore() {
            Ok(role) => {
                if let Some(role) = role
                    && let Some(username) = self.username()
                {
                    set_sentry_user(&username, role);
                }
                role
            }
            Err(e) => {
                debug!(error = %e, "No session to restore");
                None
            }
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Username from the held credential's claims.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        let claims = self.session.credential()?.claims().ok()?;
        claims.username().map(str::to_string)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Resolve `path` against the access gate.
    #[must_use]
    pub fn navigate(&self, path: &str) -> Navigation {
        let navigation = gate(path, self.session.state());
        match navigation {
            Navigation::Render(route) => {
                let shown = route.path();
                add_breadcrumb("navigation", "Viewed page", Some(&[("path", shown.as_str())]));
            }
            Navigation::Redirect { to, reason } => {
                let target = to.path();
                debug!(path, to = %target, ?reason, "Navigation redirected");
                add_breadcrumb(
                    "navigation",
                    "Redirected",
                    Some(&[("from", path), ("to", target.as_str())]),
                );
            }
        }
        navigation
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add an item to the cart.
    pub fn add_to_cart(&mut self, item: CartItem) -> &[CartItem] {
        let id = item.id.to_string();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
        self.cart.add(item)
    }

    /// Remove the line item at `index`.
    pub fn remove_from_cart(&mut self, index: usize) -> Option<CartItem> {
        let removed = self.cart.remove(index);
        if let Some(item) = &removed {
            let id = item.id.to_string();
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
        }
        removed
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        add_breadcrumb("cart", "Cleared cart", None);
    }

    /// Cart total with two decimals.
    #[must_use]
    pub fn cart_total(&self) -> String {
        self.cart.total_display()
    }

    /// Place the order for the cart's contents.
    ///
    /// Payment is simulated. On success the cart is emptied.
    ///
    /// # Errors
    ///
    /// - `AppError::NotLoggedIn` / `AppError::Forbidden` unless a customer
    ///   is logged in
    /// - `AppError::BadRequest` for a blank address or an empty cart
    #[instrument(skip(self, address))]
    pub fn checkout(&mut self, address: &str) -> Result<Receipt> {
        self.require(Role::Customer)?;

        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::BadRequest(
                "Shipping address is required".to_string(),
            ));
        }
        if self.cart.is_empty() {
            return Err(AppError::BadRequest("Your cart is empty".to_string()));
        }

        let receipt = Receipt {
            items: self.cart.items().to_vec(),
            total: self.cart.total(),
            address: address.to_string(),
        };
        self.cart.clear();
        let total = receipt.total_display();
        add_breadcrumb("checkout", "Order placed", Some(&[("total", total.as_str())]));
        info!(items = receipt.items.len(), total = %receipt.total, "Order placed");
        Ok(receipt)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in and return the landing route for the backend's role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` for transport or credential failures and
    /// `AppError::Auth` if the response carries no role.
    pub async fn login(&mut self, client: &ApiClient, form: LoginForm) -> Result<Route> {
        let ticket = self.session.ticket();
        let grant = client.login(&form).await?;
        self.finish_login(ticket, &form.username, grant, Some(form.role))
    }

    /// Admin login.
    ///
    /// # Errors
    ///
    /// See [`App::login`].
    pub async fn admin_login(
        &mut self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> Result<Route> {
        let ticket = self.session.ticket();
        let grant = client.admin_login(username, password).await?;
        self.finish_login(ticket, username, grant, Some(Role::Admin))
    }

    /// Apply a login response obtained under `ticket`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the session moved on since `ticket` or the
    /// response carries no role.
    pub fn finish_login(
        &mut self,
        ticket: Ticket,
        username: &str,
        grant: LoginGrant,
        requested: Option<Role>,
    ) -> Result<Route> {
        let role = self
            .session
            .complete_login(ticket, grant.credential, grant.role, requested)?;
        set_sentry_user(username, role);
        add_breadcrumb("auth", "Logged in", Some(&[("role", role.as_str())]));
        Ok(landing(role))
    }

    /// Create an account. The session ends up anonymous whether or not the
    /// backend accepts it; the caller is sent to the login page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the backend refuses the registration.
    pub async fn register(&mut self, client: &ApiClient, form: RegisterForm) -> Result<String> {
        let result = client.register(&form).await;
        self.session.registered();
        clear_sentry_user();
        let message = result?;
        add_breadcrumb("auth", "Registered", Some(&[("role", form.role.as_str())]));
        Ok(message)
    }

    /// Log out. Returns the route to show next.
    pub fn logout(&mut self) -> Route {
        self.session.logout();
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        Route::Home
    }

    // =========================================================================
    // Authenticated calls
    // =========================================================================

    /// Ticket and credential for a call made on behalf of `role`.
    ///
    /// # Errors
    ///
    /// `AppError::NotLoggedIn` while anonymous, `AppError::Forbidden` for any
    /// other role.
    pub fn require(&self, role: Role) -> Result<(Ticket, Credential)> {
        match (self.session.state(), self.session.credential()) {
            (SessionState::Authenticated { role: actual }, Some(credential)) if actual == role => {
                Ok((self.session.ticket(), credential.clone()))
            }
            (SessionState::Authenticated { .. }, Some(_)) => {
                Err(AppError::Forbidden { required: role })
            }
            _ => Err(AppError::NotLoggedIn),
        }
    }

    /// Ticket and credential for a call any logged-in user may make.
    ///
    /// # Errors
    ///
    /// `AppError::NotLoggedIn` while anonymous.
    pub fn require_login(&self) -> Result<(Ticket, Credential)> {
        match (self.session.state(), self.session.credential()) {
            (SessionState::Authenticated { .. }, Some(credential)) => {
                Ok((self.session.ticket(), credential.clone()))
            }
            _ => Err(AppError::NotLoggedIn),
        }
    }

    /// Pass through the result of an authenticated call made under
    /// `ticket`.
    ///
    /// A credential rejection forces the anonymous state (unless the session
    /// has already moved on); follow it with [`AppError::redirect`].
    ///
    /// # Errors
    ///
    /// Returns the call's error wrapped in `AppError::Api`.
    pub fn authorized<T>(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<T, ApiError>,
    ) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_unauthorized() && self.session.reject_credential(ticket) {
                    clear_sentry_user();
                    warn!("Session ended by the backend");
                }
                Err(e.into())
            }
        }
    }

    /// Fetch the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// `AppError::NotLoggedIn` while anonymous; a credential rejection clears
    /// the session.
    pub async fn load_profile(&mut self, client: &ApiClient) -> Result<UserProfile> {
        let (ticket, credential) = self.require_login()?;
        let result = client.profile(&credential).await;
        self.authorized(ticket, result)
    }
}

impl AppError {
    /// Where to send the user after this error, if anywhere.
    #[must_use]
    pub fn redirect(&self) -> Option<Navigation> {
        if self.is_credential_rejection() || matches!(self, Self::NotLoggedIn) {
            Some(Navigation::Redirect {
                to: Route::Login,
                reason: crate::router::DenyReason::Unauthenticated,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use green_street_core::ProductId;

    use super::*;
    use crate::session::tests::jwt;
    use crate::store::{KeyValueStore, MemoryStore, keys};

    fn app_on(store: &MemoryStore) -> App {
        App::start(Arc::new(store.clone()))
    }

    fn shirt() -> CartItem {
        CartItem::new(ProductId::new(1), "Organic Cotton Shirt", Price::from_cents(2599))
    }

    fn login_as(app: &mut App, role: Role) {
        let ticket = app.session().ticket();
        let grant = LoginGrant {
            credential: jwt(&json!({"sub": {"username": "ada", "id": 1, "role": role.as_str()}})),
            role: None,
        };
        app.finish_login(ticket, "ada", grant, Some(role)).unwrap();
    }

    fn logged_in(store: &MemoryStore, role: Role) -> App {
        let mut app = app_on(store);
        login_as(&mut app, role);
        app
    }

    #[test]
    fn test_start_is_anonymous_with_persisted_cart() {
        let store = MemoryStore::new();
        app_on(&store).add_to_cart(shirt());

        let app = app_on(&store);
        assert_eq!(app.state(), SessionState::Anonymous);
        assert_eq!(app.cart_total(), "25.99");
    }

    #[test]
    fn test_finish_login_lands_on_role_page() {
        let store = MemoryStore::new();
        let app = logged_in(&store, Role::Seller);
        assert_eq!(app.state(), SessionState::Authenticated { role: Role::Seller });
        assert_eq!(app.username().as_deref(), Some("ada"));
        assert_eq!(
            app.navigate("/dashboard"),
            Navigation::Render(Route::SellerDashboard)
        );
    }

    #[test]
    fn test_checkout_clears_cart() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Customer);
        app.add_to_cart(shirt());
        app.add_to_cart(shirt());

        let receipt = app.checkout("  1 Green Street  ").unwrap();
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.total_display(), "51.98");
        assert_eq!(receipt.address, "1 Green Street");
        assert!(app.cart().is_empty());
        assert!(app_on(&store).cart().is_empty());
    }

    #[test]
    fn test_checkout_validation() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Customer);
        assert!(matches!(app.checkout("1 Green Street"), Err(AppError::BadRequest(_))));

        app.add_to_cart(shirt());
        assert!(matches!(app.checkout("   "), Err(AppError::BadRequest(_))));
        assert_eq!(app.cart().len(), 1);
    }

    #[test]
    fn test_checkout_requires_customer() {
        let store = MemoryStore::new();
        let mut anonymous = app_on(&store);
        anonymous.add_to_cart(shirt());
        assert!(matches!(
            anonymous.checkout("1 Green Street"),
            Err(AppError::NotLoggedIn)
        ));

        let mut seller = logged_in(&MemoryStore::new(), Role::Seller);
        assert!(matches!(
            seller.checkout("1 Green Street"),
            Err(AppError::Forbidden {
                required: Role::Customer
            })
        ));
    }

    #[test]
    fn test_authorized_rejection_forces_anonymous() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Customer);
        let (ticket, _) = app.require_login().unwrap();

        let err = app
            .authorized::<()>(ticket, Err(ApiError::Unauthorized("Token has expired".into())))
            .unwrap_err();
        assert!(err.is_credential_rejection());
        assert_eq!(err.redirect().map(|n| n.route()), Some(Route::Login));
        assert_eq!(app.state(), SessionState::Anonymous);
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    }

    #[test]
    fn test_authorized_stale_rejection_is_ignored() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Customer);
        let (stale, _) = app.require_login().unwrap();

        app.logout();
        login_as(&mut app, Role::Seller);
        let _ = app.authorized::<()>(stale, Err(ApiError::Unauthorized(String::new())));
        assert_eq!(app.state(), SessionState::Authenticated { role: Role::Seller });
    }

    #[test]
    fn test_other_errors_keep_session() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Customer);
        let (ticket, _) = app.require_login().unwrap();
        let err = app
            .authorized::<()>(
                ticket,
                Err(ApiError::Rejected {
                    status: 500,
                    message: "boom".into(),
                }),
            )
            .unwrap_err();
        assert_eq!(err.redirect(), None);
        assert!(app.session().is_authenticated());
    }

    #[test]
    fn test_logout_goes_home() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store, Role::Admin);
        assert_eq!(app.logout(), Route::Home);
        assert_eq!(app.navigate("/admin").route(), Route::Login);
    }
}
