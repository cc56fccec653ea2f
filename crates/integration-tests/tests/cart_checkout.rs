//! Cart persistence and checkout with a file-backed store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use green_street_core::{CartItem, Role};
use green_street_integration_tests::{MockBackend, temp_state_path};
use green_street_storefront::api::LoginForm;
use green_street_storefront::app::App;
use green_street_storefront::store::FileStore;

fn file_app(path: &std::path::Path) -> App {
    App::start(Arc::new(FileStore::new(path)))
}

#[tokio::test]
async fn test_cart_from_listing_survives_restart() {
    let backend = MockBackend::spawn().await;
    backend.add_product("Organic Cotton Shirt", 25.99, Some(85));
    backend.add_product("Solar-Powered Charger", 45.99, None);
    let path = temp_state_path();

    let mut app = file_app(&path);
    let products = backend.client().products().await.unwrap();
    for product in products.iter() {
        app.add_to_cart(CartItem::from(product));
    }
    assert_eq!(app.cart_total(), "71.98");

    let restarted = file_app(&path);
    assert_eq!(restarted.cart().items(), app.cart().items());
    assert_eq!(restarted.cart_total(), "71.98");
    assert_eq!(restarted.cart().items()[0].eco_score, Some(85));
}

#[tokio::test]
async fn test_checkout_empties_persisted_cart() {
    let backend = MockBackend::spawn().await;
    backend.add_user("ada", "secret", Role::Customer);
    backend.add_product("Bamboo Toothbrush", 4.5, Some(90));
    let client = backend.client();
    let path = temp_state_path();

    let mut app = file_app(&path);
    app.login(
        &client,
        LoginForm {
            username: "ada".to_string(),
            password: "secret".to_string(),
            role: Role::Customer,
        },
    )
    .await
    .unwrap();
    let products = client.products().await.unwrap();
    app.add_to_cart(CartItem::from(&products[0]));
    app.add_to_cart(CartItem::from(&products[0]));

    let receipt = app.checkout("1 Green Street").unwrap();
    assert_eq!(receipt.total_display(), "9.00");
    assert!(file_app(&path).cart().is_empty());
}

#[test]
fn test_unwritable_store_keeps_cart_in_memory() {
    // A directory where the state file should be makes every write fail.
    let path = temp_state_path();
    std::fs::create_dir_all(&path).unwrap();

    let mut app = file_app(&path);
    app.add_to_cart(CartItem::new(
        green_street_core::ProductId::new(1),
        "Jute Bag",
        "7.50".parse().unwrap(),
    ));

    assert_eq!(app.cart().len(), 1);
    assert_eq!(app.cart_total(), "7.50");
    assert!(file_app(&path).cart().is_empty());
}
