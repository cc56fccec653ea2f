//! Cart state with write-through persistence.
//!
//! The cart is an ordered multiset: adding the same product twice yields two
//! line items, and display and totals follow insertion order. After every
//! mutation the full cart is written to the store under
//! [`keys::CART_ITEMS`] before the mutating call returns.
//!
//! # Persisted layout
//!
//! ```json
//! {"version": 1, "items": [{"id": 1, "name": "Organic Cotton Shirt", "price": 25.99}]}
//! ```
//!
//! A bare JSON array (the unversioned layout) is still accepted on load.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use green_street_core::{CartItem, Price};

use crate::store::{SharedStore, keys};

/// Current version of the persisted cart layout.
pub const CART_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedCartRef<'a> {
    version: u32,
    items: &'a [CartItem],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { version: u32, items: Vec<CartItem> },
    Unversioned(Vec<CartItem>),
}

/// Decode a persisted cart. Returns `None` for anything unreadable.
fn decode(raw: &str) -> Option<Vec<CartItem>> {
    match serde_json::from_str::<StoredCart>(raw) {
        Ok(StoredCart::Versioned { version, items }) if version <= CART_FORMAT_VERSION => {
            Some(items)
        }
        Ok(StoredCart::Versioned { version, .. }) => {
            warn!(version, "Stored cart has a newer layout, starting empty");
            None
        }
        Ok(StoredCart::Unversioned(items)) => Some(items),
        Err(e) => {
            warn!(error = %e, "Stored cart is unreadable, starting empty");
            None
        }
    }
}

/// The shopper's cart.
pub struct Cart {
    items: Vec<CartItem>,
    store: SharedStore,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart").field("items", &self.items).finish()
    }
}

impl Cart {
    /// Hydrate the cart from the store.
    ///
    /// Never fails: an absent, unreadable or unparseable entry yields an
    /// empty cart.
    #[must_use]
    pub fn initialize(store: SharedStore) -> Self {
        let items = match store.get(keys::CART_ITEMS) {
            Ok(Some(raw)) => decode(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Cart store unavailable, starting empty");
                Vec::new()
            }
        };
        debug!(items = items.len(), "Cart initialized");
        Self { items, store }
    }

    /// Append an item and persist. Duplicates are kept as separate lines.
    pub fn add(&mut self, item: CartItem) -> &[CartItem] {
        self.items.push(item);
        self.persist();
        &self.items
    }

    /// Remove the line item at `index` and persist.
    ///
    /// Only that occurrence is removed. Out-of-range indexes are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.persist();
        Some(removed)
    }

    /// Empty the cart and persist.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Exact sum of all line prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Total with two decimals, rounded half-up (e.g. `"71.98"`).
    #[must_use]
    pub fn total_display(&self) -> String {
        self.total().display()
    }

    /// Write the full cart through to the store.
    ///
    /// Failures are logged and swallowed; the previous persisted value stays.
    fn persist(&self) {
        let payload = PersistedCartRef {
            version: CART_FORMAT_VERSION,
            items: &self.items,
        };
        let serialized = match serde_json::to_string(&payload) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.store.set(keys::CART_ITEMS, &serialized) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}
