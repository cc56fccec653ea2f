//! Seller product management: two-step save, partial failure, deletion.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use green_street_core::{ProductDraft, ProductId, Role};
use green_street_integration_tests::MockBackend;
use green_street_storefront::api::{ApiClient, ApiError, LoginForm};
use green_street_storefront::app::App;
use green_street_storefront::error::AppError;
use green_street_storefront::store::MemoryStore;

fn draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price: "12.00".parse().unwrap(),
        description: "Woven from recycled fibres".to_string(),
        material: "recycled cotton".to_string(),
        certifications: "GOTS".to_string(),
        ..ProductDraft::default()
    }
}

async fn seller(backend: &MockBackend, client: &ApiClient) -> App {
    backend.add_user("sam", "secret", Role::Seller);
    let mut app = App::start(Arc::new(MemoryStore::new()));
    app.login(
        client,
        LoginForm {
            username: "sam".to_string(),
            password: "secret".to_string(),
            role: Role::Seller,
        },
    )
    .await
    .unwrap();
    app
}

#[tokio::test]
async fn test_create_scores_then_saves() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let app = seller(&backend, &client).await;
    let (_, credential) = app.require(Role::Seller).unwrap();

    let eco_score = client.create_product(&credential, &draft("Tote Bag")).await.unwrap();

    assert_eq!(eco_score, 60);
    assert_eq!(backend.eco_score_calls(), 1);
    let listed = client.seller_products(&credential).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].eco_score, Some(60));
}

#[tokio::test]
async fn test_failed_save_is_partial_failure() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let mut app = seller(&backend, &client).await;
    backend.set_fail_product_saves(true);

    let (ticket, credential) = app.require(Role::Seller).unwrap();
    let result = client.create_product(&credential, &draft("Tote Bag")).await;
    let err = app.authorized(ticket, result).unwrap_err();

    assert!(matches!(
        err,
        AppError::Api(ApiError::PartialFailure {
            completed: "eco score calculation",
            failed: "product creation",
            ..
        })
    ));
    assert_eq!(
        err.user_message(),
        "The eco score calculation succeeded, but the product creation failed: Database unavailable"
    );
    assert!(backend.product_names().is_empty());
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn test_update_and_delete_refresh_listing() {
    let backend = MockBackend::spawn().await;
    let id = ProductId::new(backend.add_product("Old Name", 5.0, Some(40)));
    let client = backend.client();
    let app = seller(&backend, &client).await;
    let (_, credential) = app.require(Role::Seller).unwrap();

    assert_eq!(client.products().await.unwrap()[0].name, "Old Name");

    client
        .update_product(&credential, id, &draft("New Name"))
        .await
        .unwrap();
    assert_eq!(client.products().await.unwrap()[0].name, "New Name");

    client.delete_product(&credential, id).await.unwrap();
    assert!(client.products().await.unwrap().is_empty());
    assert_eq!(backend.listing_hits(), 3);
}

#[tokio::test]
async fn test_delete_unknown_product_is_rejected() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let app = seller(&backend, &client).await;
    let (_, credential) = app.require(Role::Seller).unwrap();

    let err = client
        .delete_product(&credential, ProductId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 404, .. }));
    assert_eq!(err.user_message(), "Product not found!");
}

#[tokio::test]
async fn test_customer_cannot_manage_products() {
    let backend = MockBackend::spawn().await;
    backend.add_user("ada", "secret", Role::Customer);
    let client = backend.client();
    let mut app = App::start(Arc::new(MemoryStore::new()));
    app.login(
        &client,
        LoginForm {
            username: "ada".to_string(),
            password: "secret".to_string(),
            role: Role::Seller,
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        app.require(Role::Seller),
        Err(AppError::Forbidden {
            required: Role::Seller
        })
    ));
}
