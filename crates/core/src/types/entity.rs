//! Entity schemas exchanged with the backend.
//!
//! Every response body is parsed into one of these shapes at the API client
//! boundary; nothing downstream reads raw JSON.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::id::{ProductId, RecycleItemId, UserId};
use crate::types::price::Price;
use crate::types::status::{RecycleStatus, Role};

/// Eco score assigned by the backend; opaque to the client.
pub type EcoScore = i32;

/// A product as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub eco_score: Option<EcoScore>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product snapshot taken when it was added to the cart.
///
/// Not re-validated against the backend afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco_score: Option<EcoScore>,
}

impl CartItem {
    /// Create a new cart line item.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            eco_score: None,
        }
    }

    /// Attach an eco score.
    #[must_use]
    pub const fn with_eco_score(mut self, eco_score: EcoScore) -> Self {
        self.eco_score = Some(eco_score);
        self
    }
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            eco_score: product.eco_score,
        }
    }
}

/// Seller-side product form.
///
/// Field names follow the backend's mixed casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub material: String,
    pub certifications: String,
    #[serde(rename = "manufacturingLocation")]
    pub manufacturing_location: String,
    pub durability: String,
    #[serde(rename = "endOfLife")]
    pub end_of_life: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco_score: Option<EcoScore>,
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// A user row on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// An item submitted to the recycle program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecycleItem {
    pub id: RecycleItemId,
    pub product_name: String,
    pub material: String,
    pub condition: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: RecycleStatus,
    #[serde(default)]
    pub date_submitted: Option<String>,
}

/// Form for submitting a recycle item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecycleItem {
    pub product_name: String,
    pub material: String,
    pub condition: String,
    #[serde(default)]
    pub description: String,
}

/// A discount voucher earned through the recycle program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    /// Discount percentage.
    pub discount_value: f64,
    /// Backend timestamps are naive UTC, in RFC 2822 or ISO form.
    pub valid_until: String,
    #[serde(default)]
    pub is_redeemed: bool,
}

impl Voucher {
    /// Parse `valid_until`, accepting the formats the backend emits.
    #[must_use]
    pub fn valid_until_parsed(&self) -> Option<NaiveDateTime> {
        chrono::DateTime::parse_from_rfc2822(&self.valid_until)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(&self.valid_until, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

/// Eco score row on the public eco-score page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcoScoreEntry {
    pub product_id: ProductId,
    pub product_name: String,
    pub value: EcoScore,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_without_eco_score() {
        let product: Product =
            serde_json::from_str(r#"{"id": 3, "name": "Bamboo Brush", "price": 4.5}"#).unwrap();
        assert_eq!(product.eco_score, None);
        assert_eq!(product.price.display(), "4.50");
    }

    #[test]
    fn test_cart_item_from_product() {
        let product = Product {
            id: ProductId::new(2),
            name: "Solar-Powered Charger".to_string(),
            price: Price::from_cents(4599),
            eco_score: Some(90),
            description: None,
        };
        let item = CartItem::from(&product);
        assert_eq!(item.id, ProductId::new(2));
        assert_eq!(item.eco_score, Some(90));
    }

    #[test]
    fn test_draft_uses_backend_field_names() {
        let draft = ProductDraft {
            name: "Jute Bag".to_string(),
            manufacturing_location: "Kolkata".to_string(),
            end_of_life: "Compost".to_string(),
            ..ProductDraft::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["manufacturingLocation"], "Kolkata");
        assert_eq!(json["endOfLife"], "Compost");
        assert!(json.get("eco_score").is_none());
    }

    #[test]
    fn test_voucher_dates() {
        let voucher = Voucher {
            code: "AB12CD34EF".to_string(),
            discount_value: 15.0,
            valid_until: "Tue, 19 Nov 2024 10:00:00 GMT".to_string(),
            is_redeemed: false,
        };
        assert!(voucher.valid_until_parsed().is_some());

        let iso = Voucher {
            valid_until: "2024-11-19T10:00:00.123456".to_string(),
            ..voucher
        };
        assert!(iso.valid_until_parsed().is_some());
    }

    #[test]
    fn test_eco_score_entry_is_camel_case() {
        let entry: EcoScoreEntry =
            serde_json::from_str(r#"{"productId": 1, "productName": "Shirt", "value": 85}"#)
                .unwrap();
        assert_eq!(entry.value, 85);
    }
}
