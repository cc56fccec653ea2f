//! Public catalogue endpoints: listing normalisation, caching, eco scores.

#![allow(clippy::unwrap_used)]

use green_street_integration_tests::{ListingShape, MockBackend};
use green_street_storefront::api::ApiError;
use serde_json::json;

#[tokio::test]
async fn test_listing_shapes_are_normalised() {
    let backend = MockBackend::spawn().await;
    backend.add_product("Organic Cotton Shirt", 25.99, Some(85));

    backend.set_listing(ListingShape::Wrapped);
    assert_eq!(backend.client().products().await.unwrap().len(), 1);

    backend.set_listing(ListingShape::Bare);
    assert_eq!(backend.client().products().await.unwrap().len(), 1);

    backend.set_listing(ListingShape::Garbage);
    assert!(backend.client().products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_entries_are_skipped() {
    let backend = MockBackend::spawn().await;
    backend.add_product("Jute Bag", 7.5, None);
    backend.add_raw_product(json!("Reusable Straw"));
    backend.add_raw_product(json!({"id": 99, "name": "Refund", "price": -3}));

    let products = backend.client().products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Jute Bag");
    assert_eq!(products[0].price.display(), "7.50");
}

#[tokio::test]
async fn test_listing_is_cached_per_client() {
    let backend = MockBackend::spawn().await;
    backend.add_product("Organic Cotton Shirt", 25.99, Some(85));
    let client = backend.client();

    client.products().await.unwrap();
    client.products().await.unwrap();
    assert_eq!(backend.listing_hits(), 1);

    client.clone().products().await.unwrap();
    assert_eq!(backend.listing_hits(), 1);

    backend.client().products().await.unwrap();
    assert_eq!(backend.listing_hits(), 2);
}

#[tokio::test]
async fn test_eco_scores_and_dynamic_price() {
    let backend = MockBackend::spawn().await;
    backend.add_product("Organic Cotton Shirt", 25.99, Some(85));
    backend.add_product("Solar-Powered Charger", 45.99, None);
    let client = backend.client();

    let scores = client.eco_scores().await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].product_name, "Organic Cotton Shirt");
    assert_eq!(scores[0].value, 85);

    let price = client.dynamic_price().await.unwrap().unwrap();
    assert_eq!(price.display(), "19.99");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let backend = MockBackend::spawn().await;
    let mut config = backend.config();
    config.api_base_url = "http://127.0.0.1:9/".parse().unwrap();
    let client = green_street_storefront::api::ApiClient::new(&config).unwrap();

    let err = client.products().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(
        err.user_message(),
        "Could not reach the server. Check your connection and try again."
    );
}
