//! Route table and access gate.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! /                          - Home
//! /products                  - Product listing
//! /products/{id}             - Product detail
//! /cart                      - Cart
//! /login                     - Login
//! /register                  - Register
//! /eco-score                 - Eco scores
//!
//! # Customer
//! /profile                   - Profile
//! /checkout                  - Checkout
//! /recycle-program           - Recycle program submissions
//! /eco-points                - Eco points and vouchers
//!
//! # Seller
//! /dashboard                 - Seller dashboard
//! /dashboard/products        - Product management
//! /dashboard/pricing         - Dynamic pricing rules
//!
//! # Admin
//! /admin                     - Admin dashboard
//! /admin/recycle-approvals   - Recycle approvals
//! ```
//!
//! [`gate`] is a pure function of the path and the session state. Denied
//! access is always an explicit redirect, never a silently missing route:
//! anonymous visitors go to `/login`, logged-in users with the wrong role go
//! to their own landing page.

use green_street_core::{ProductId, Role};

use crate::session::SessionState;

/// A resolved view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    ProductDetail(ProductId),
    Cart,
    Login,
    Register,
    EcoScores,
    Profile,
    Checkout,
    RecycleProgram,
    EcoPoints,
    SellerDashboard,
    ProductManagement,
    DynamicPricing,
    AdminDashboard,
    RecycleApprovals,
    NotFound,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Role(Role),
}

/// Why a navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Nobody is logged in.
    Unauthenticated,
    /// Logged in, but with a different role.
    WrongRole { required: Role, actual: Role },
}

/// Outcome of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect { to: Route, reason: DenyReason },
}

impl Navigation {
    /// The route that ends up on screen.
    #[must_use]
    pub const fn route(&self) -> Route {
        match self {
            Self::Render(route) | Self::Redirect { to: route, .. } => *route,
        }
    }
}

impl Route {
    /// Resolve a path. Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["products"] => Self::Products,
            ["products", id] => id.parse().map_or(Self::NotFound, Self::ProductDetail),
            ["cart"] => Self::Cart,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["eco-score"] => Self::EcoScores,
            ["profile"] => Self::Profile,
            ["checkout"] => Self::Checkout,
            ["recycle-program"] => Self::RecycleProgram,
            ["eco-points"] => Self::EcoPoints,
            ["dashboard"] => Self::SellerDashboard,
            ["dashboard", "products"] => Self::ProductManagement,
            ["dashboard", "pricing"] => Self::DynamicPricing,
            ["admin"] => Self::AdminDashboard,
            ["admin", "recycle-approvals"] => Self::RecycleApprovals,
            _ => Self::NotFound,
        }
    }

    /// Canonical path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Products => "/products".to_string(),
            Self::ProductDetail(id) => format!("/products/{id}"),
            Self::Cart => "/cart".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::EcoScores => "/eco-score".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::RecycleProgram => "/recycle-program".to_string(),
            Self::EcoPoints => "/eco-points".to_string(),
            Self::SellerDashboard => "/dashboard".to_string(),
            Self::ProductManagement => "/dashboard/products".to_string(),
            Self::DynamicPricing => "/dashboard/pricing".to_string(),
            Self::AdminDashboard => "/admin".to_string(),
            Self::RecycleApprovals => "/admin/recycle-approvals".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// Access requirement of the route.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Home
            | Self::Products
            | Self::ProductDetail(_)
            | Self::Cart
            | Self::Login
            | Self::Register
            | Self::EcoScores
            | Self::NotFound => Access::Public,
            Self::Profile | Self::Checkout | Self::RecycleProgram | Self::EcoPoints => {
                Access::Role(Role::Customer)
            }
            Self::SellerDashboard | Self::ProductManagement | Self::DynamicPricing => {
                Access::Role(Role::Seller)
            }
            Self::AdminDashboard | Self::RecycleApprovals => Access::Role(Role::Admin),
        }
    }
}

/// Where a role lands after login, and where it is sent when it strays.
#[must_use]
pub const fn landing(role: Role) -> Route {
    match role {
        Role::Customer => Route::Profile,
        Role::Seller => Route::SellerDashboard,
        Role::Admin => Route::AdminDashboard,
    }
}

/// Decide what `path` shows for `session`.
#[must_use]
pub fn gate(path: &str, session: SessionState) -> Navigation {
    let route = Route::parse(path);
    match (route.access(), session) {
        (Access::Public, _) => Navigation::Render(route),
        (Access::Role(_), SessionState::Anonymous) => Navigation::Redirect {
            to: Route::Login,
            reason: DenyReason::Unauthenticated,
        },
        (Access::Role(required), SessionState::Authenticated { role }) if required == role => {
            Navigation::Render(route)
        }
        (Access::Role(required), SessionState::Authenticated { role }) => Navigation::Redirect {
            to: landing(role),
            reason: DenyReason::WrongRole {
                required,
                actual: role,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELLER: SessionState = SessionState::Authenticated { role: Role::Seller };
    const CUSTOMER: SessionState = SessionState::Authenticated {
        role: Role::Customer,
    };
    const ADMIN: SessionState = SessionState::Authenticated { role: Role::Admin };

    #[test]
    fn test_parse_normalises_paths() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/cart/"), Route::Cart);
        assert_eq!(Route::parse("/products?sort=eco#top"), Route::Products);
        assert_eq!(
            Route::parse("/products/12"),
            Route::ProductDetail(ProductId::new(12))
        );
        assert_eq!(Route::parse("/products/shirt"), Route::NotFound);
        assert_eq!(Route::parse("/dashboard/products"), Route::ProductManagement);
        assert_eq!(Route::parse("/nowhere"), Route::NotFound);
    }

    #[test]
    fn test_path_round_trips() {
        for route in [
            Route::Home,
            Route::ProductDetail(ProductId::new(3)),
            Route::EcoScores,
            Route::RecycleProgram,
            Route::DynamicPricing,
            Route::RecycleApprovals,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_anonymous_sees_public_routes() {
        for path in ["/", "/products", "/cart", "/login", "/register", "/eco-score"] {
            assert!(matches!(
                gate(path, SessionState::Anonymous),
                Navigation::Render(_)
            ));
        }
    }

    #[test]
    fn test_anonymous_redirected_from_seller_routes() {
        for path in ["/dashboard", "/dashboard/products", "/dashboard/pricing"] {
            assert_eq!(
                gate(path, SessionState::Anonymous),
                Navigation::Redirect {
                    to: Route::Login,
                    reason: DenyReason::Unauthenticated
                }
            );
        }
    }

    #[test]
    fn test_anonymous_redirected_from_customer_routes() {
        for path in ["/profile", "/checkout"] {
            assert_eq!(gate(path, SessionState::Anonymous).route(), Route::Login);
        }
    }

    #[test]
    fn test_seller_reaches_dashboard_and_login() {
        assert_eq!(
            gate("/dashboard", SELLER),
            Navigation::Render(Route::SellerDashboard)
        );
        assert_eq!(gate("/login", SELLER), Navigation::Render(Route::Login));
    }

    #[test]
    fn test_cross_role_access_redirects() {
        assert_eq!(
            gate("/dashboard", CUSTOMER),
            Navigation::Redirect {
                to: Route::Profile,
                reason: DenyReason::WrongRole {
                    required: Role::Seller,
                    actual: Role::Customer
                }
            }
        );
        assert_eq!(gate("/checkout", SELLER).route(), Route::SellerDashboard);
        assert_eq!(gate("/admin", SELLER).route(), Route::SellerDashboard);
        assert_eq!(gate("/dashboard", ADMIN).route(), Route::AdminDashboard);
    }

    #[test]
    fn test_landing_pages() {
        assert_eq!(landing(Role::Customer), Route::Profile);
        assert_eq!(landing(Role::Seller), Route::SellerDashboard);
        assert_eq!(landing(Role::Admin), Route::AdminDashboard);
    }
}
