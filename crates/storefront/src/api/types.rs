//! Request and response bodies of the backend API.
//!
//! Responses are normalised here so that the rest of the crate only sees
//! validated entities from `green_street_core`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use green_street_core::{Credential, EcoScore, Price, Product, Role};

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Role picked on the form. Sent along, but never trusted locally.
    pub role: Role,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Admin login form.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AdminLoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login: the credential plus any role the backend echoed.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub credential: Credential,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl From<LoginResponse> for LoginGrant {
    fn from(response: LoginResponse) -> Self {
        Self {
            credential: Credential::new(response.access_token),
            role: response.role,
        }
    }
}

/// Body of plain acknowledgement responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcoScoreResponse {
    pub eco_score: EcoScore,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcoScoresResponse {
    #[serde(default)]
    pub scores: Vec<green_street_core::EcoScoreEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DynamicPriceResponse {
    #[serde(default)]
    pub dynamic_price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EcoPointsResponse {
    #[serde(default)]
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecycleDecisionBody {
    pub status: green_street_core::RecycleDecision,
}

/// Pull a human-readable message out of an error body.
///
/// The backend uses `message`; its JWT layer uses `msg`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
}

/// Normalise a product listing.
///
/// Accepts a bare array or an object with a `products` array. Elements that
/// do not parse as products, or carry a negative price, are skipped. Any
/// other shape yields an empty listing.
pub(crate) fn normalize_products(value: Value) -> Vec<Product> {
    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut object) => match object.remove("products") {
            Some(Value::Array(elements)) => elements,
            _ => {
                warn!("Product listing object has no products array");
                return Vec::new();
            }
        },
        other => {
            warn!(kind = %json_kind(&other), "Product listing has an unexpected shape");
            return Vec::new();
        }
    };

    let total = elements.len();
    let products: Vec<Product> = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<Product>(element).ok())
        .filter(|product| !product.price.is_negative())
        .collect();
    if products.len() < total {
        warn!(
            skipped = total - products.len(),
            "Skipped malformed product records"
        );
    }
    products
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_message_fields() {
        assert_eq!(
            error_message(r#"{"message": "Invalid credentials!"}"#).as_deref(),
            Some("Invalid credentials!")
        );
        assert_eq!(
            error_message(r#"{"msg": "Token has expired"}"#).as_deref(),
            Some("Token has expired")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"message": ""}"#), None);
    }

    #[test]
    fn test_normalize_bare_array() {
        let products = normalize_products(json!([
            {"id": 1, "name": "Organic Cotton Shirt", "price": 25.99, "eco_score": 85},
            {"id": 2, "name": "Solar-Powered Charger", "price": 45.99}
        ]));
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].eco_score, None);
    }

    #[test]
    fn test_normalize_wrapped_listing() {
        let products = normalize_products(json!({
            "products": [{"id": 1, "name": "Shirt", "price": 25.99}]
        }));
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn test_normalize_skips_bad_records() {
        let products = normalize_products(json!([
            "Bamboo Toothbrush",
            {"id": 2, "name": "Refund", "price": -5},
            {"id": 3, "name": "Jute Bag", "price": "7.50"}
        ]));
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price.display(), "7.50");
    }

    #[test]
    fn test_normalize_unexpected_shape() {
        assert!(normalize_products(json!({"message": "Unauthorized"})).is_empty());
        assert!(normalize_products(json!("nope")).is_empty());
    }
}
