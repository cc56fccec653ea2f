//! Recycle submissions, admin review and vouchers.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use green_street_core::{NewRecycleItem, RecycleDecision, RecycleItemId, RecycleStatus, Role};
use green_street_integration_tests::MockBackend;
use green_street_storefront::api::{ApiClient, LoginForm};
use green_street_storefront::app::App;
use green_street_storefront::store::MemoryStore;

async fn customer(backend: &MockBackend, client: &ApiClient) -> App {
    backend.add_user("ada", "secret", Role::Customer);
    let mut app = App::start(Arc::new(MemoryStore::new()));
    app.login(
        client,
        LoginForm {
            username: "ada".to_string(),
            password: "secret".to_string(),
            role: Role::Customer,
        },
    )
    .await
    .unwrap();
    app
}

async fn admin(backend: &MockBackend, client: &ApiClient) -> App {
    backend.add_admin("root", "secret");
    let mut app = App::start(Arc::new(MemoryStore::new()));
    app.admin_login(client, "root", "secret").await.unwrap();
    app
}

fn bottle() -> NewRecycleItem {
    NewRecycleItem {
        product_name: "Glass Bottle".to_string(),
        material: "glass".to_string(),
        condition: "good".to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn test_submission_is_listed_as_pending() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let app = customer(&backend, &client).await;
    let (_, credential) = app.require(Role::Customer).unwrap();

    let message = client.submit_recycle_item(&credential, &bottle()).await.unwrap();
    assert_eq!(message, "Recycle item submitted successfully!");

    let items = client.recycle_items(&credential).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "Glass Bottle");
    assert_eq!(items[0].status, RecycleStatus::Pending);
}

#[tokio::test]
async fn test_approval_issues_voucher() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let shopper = customer(&backend, &client).await;
    let reviewer = admin(&backend, &client).await;
    let (_, shopper_credential) = shopper.require(Role::Customer).unwrap();
    let (_, admin_credential) = reviewer.require(Role::Admin).unwrap();

    client
        .submit_recycle_item(&shopper_credential, &bottle())
        .await
        .unwrap();
    let pending = client.admin_recycle_items(&admin_credential).await.unwrap();
    assert_eq!(pending.len(), 1);
    let id: RecycleItemId = pending[0].id;

    let message = client
        .decide_recycle_item(&admin_credential, id, RecycleDecision::Approved)
        .await
        .unwrap();
    assert_eq!(message, "Item Approved successfully!");
    assert_eq!(backend.recycle_status(id.into()).as_deref(), Some("Approved"));
    assert!(client.admin_recycle_items(&admin_credential).await.unwrap().is_empty());

    let vouchers = client.vouchers(&shopper_credential).await.unwrap();
    assert_eq!(vouchers.len(), 1);
    assert!((vouchers[0].discount_value - 15.0).abs() < f64::EPSILON);
    assert!(vouchers[0].valid_until_parsed().is_some());
}

#[tokio::test]
async fn test_rejection_issues_no_voucher() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let shopper = customer(&backend, &client).await;
    let reviewer = admin(&backend, &client).await;
    let (_, shopper_credential) = shopper.require(Role::Customer).unwrap();
    let (_, admin_credential) = reviewer.require(Role::Admin).unwrap();

    client
        .submit_recycle_item(&shopper_credential, &bottle())
        .await
        .unwrap();
    let id = client.admin_recycle_items(&admin_credential).await.unwrap()[0].id;
    client
        .decide_recycle_item(&admin_credential, id, RecycleDecision::Rejected)
        .await
        .unwrap();

    let items = client.recycle_items(&shopper_credential).await.unwrap();
    assert_eq!(items[0].status, RecycleStatus::Rejected);
    assert!(client.vouchers(&shopper_credential).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_eco_points_and_admin_users() {
    let backend = MockBackend::spawn().await;
    backend.set_eco_points(120);
    let client = backend.client();
    let shopper = customer(&backend, &client).await;
    let reviewer = admin(&backend, &client).await;
    let (_, shopper_credential) = shopper.require(Role::Customer).unwrap();
    let (_, admin_credential) = reviewer.require(Role::Admin).unwrap();

    assert_eq!(client.eco_points(&shopper_credential).await.unwrap(), 120);

    let users = client.admin_users(&admin_credential).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "ada");
    assert_eq!(users[0].role, Role::Customer);
}
