//! Route handlers of the mock backend.
//!
//! Status codes and bodies follow the real backend: `{"message": ...}` for
//! application errors, `{"msg": ...}` from the JWT layer.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};

use green_street_core::Role;

use crate::{ListingShape, MockState, MockUser, SharedState, identity_of, lock, token_for};

pub(crate) fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/admin/login", post(admin_login))
        .route("/api/profile", get(profile))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/api/calculate-eco-score", post(calculate_eco_score))
        .route("/api/eco-scores", get(eco_scores))
        .route("/api/dynamic-pricing", get(dynamic_pricing))
        .route("/api/recycle", post(submit_recycle))
        .route("/api/recycle_items", get(recycle_items))
        .route("/api/vouchers", get(vouchers))
        .route("/api/eco_points", get(eco_points))
        .route("/api/admin/recycle_items", get(admin_recycle_items))
        .route("/api/admin/recycle_item/{id}", put(decide_recycle_item))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/products", get(admin_products))
        .with_state(state)
}

// =============================================================================
// Helpers
// =============================================================================

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Caller identity from the bearer token, or the JWT layer's refusal.
fn identity(state: &MockState, headers: &HeaderMap) -> Result<(i32, Role), Response> {
    let refuse =
        |text: &str| (StatusCode::UNAUTHORIZED, Json(json!({ "msg": text }))).into_response();

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| refuse("Missing Authorization Header"))?;
    if state.revoked {
        return Err(refuse("Token has been revoked"));
    }
    let sub = identity_of(token).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "msg": "Not enough segments" })),
        )
            .into_response()
    })?;
    let id = sub
        .get("id")
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .unwrap_or_default();
    let role = field(&sub, "role").parse().unwrap_or_default();
    Ok((id, role))
}

fn require(state: &MockState, headers: &HeaderMap, role: Role) -> Result<i32, Response> {
    let (id, actual) = identity(state, headers)?;
    if actual == role {
        Ok(id)
    } else {
        Err(message(StatusCode::FORBIDDEN, "Unauthorized"))
    }
}

fn grant(state: &MockState, user: &MockUser) -> Response {
    let access_token = if state.omit_role {
        crate::token_with_claims(&json!({"sub": {"username": user.username, "id": user.id}}))
    } else {
        token_for(&user.username, user.id, user.role, 3600)
    };
    let body = if state.echo_role {
        json!({ "access_token": access_token, "role": user.role })
    } else {
        json!({ "access_token": access_token })
    };
    (StatusCode::OK, Json(body)).into_response()
}

// =============================================================================
// Auth
// =============================================================================

async fn register(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let username = field(&body, "username");
    if state.users.iter().any(|u| u.username == username) {
        return message(StatusCode::BAD_REQUEST, "User already exists!");
    }
    let id = state.next_id();
    let user = MockUser {
        id,
        username: username.to_string(),
        password: field(&body, "password").to_string(),
        role: field(&body, "role").parse().unwrap_or_default(),
    };
    state.users.push(user);
    message(StatusCode::CREATED, "User registered successfully!")
}

async fn login(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    // The role picked on the form is ignored, as on the real backend.
    let user = state
        .users
        .iter()
        .find(|u| u.username == field(&body, "username") && u.password == field(&body, "password"));
    match user {
        Some(user) => grant(&state, user),
        None => message(StatusCode::UNAUTHORIZED, "Invalid credentials!"),
    }
}

async fn admin_login(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    let admin = state
        .admins
        .iter()
        .find(|u| u.username == field(&body, "username") && u.password == field(&body, "password"));
    match admin {
        Some(admin) => grant(&state, admin),
        None => message(StatusCode::UNAUTHORIZED, "Invalid admin credentials!"),
    }
}

async fn profile(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let (id, _) = match identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    match state.users.iter().chain(&state.admins).find(|u| u.id == id) {
        Some(user) => Json(json!({
            "username": user.username,
            "id": user.id,
            "role": user.role,
        }))
        .into_response(),
        None => message(StatusCode::NOT_FOUND, "User not found!"),
    }
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if headers.contains_key(header::AUTHORIZATION) {
        if let Err(response) = identity(&state, &headers) {
            return response;
        }
        return Json(Value::Array(state.products.clone())).into_response();
    }

    state.listing_hits += 1;
    let products = Value::Array(state.products.clone());
    match state.listing {
        ListingShape::Wrapped => Json(json!({ "products": products })).into_response(),
        ListingShape::Bare => Json(products).into_response(),
        ListingShape::Garbage => message(StatusCode::OK, "Catalogue is being rebuilt"),
    }
}

fn score(body: &Value) -> i64 {
    let filled = ["material", "certifications", "manufacturingLocation", "durability", "endOfLife"]
        .iter()
        .filter(|key| !field(body, key).is_empty())
        .count();
    40 + 10 * i64::try_from(filled).unwrap_or_default()
}

async fn calculate_eco_score(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Seller) {
        return response;
    }
    state.eco_score_calls += 1;
    Json(json!({ "eco_score": score(&body) })).into_response()
}

async fn create_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Seller) {
        return response;
    }
    if state.fail_product_saves {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    let id = state.next_id();
    let mut product = body;
    product["id"] = json!(id);
    state.products.push(product);
    message(StatusCode::CREATED, "Product created successfully!")
}

async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Seller) {
        return response;
    }
    if state.fail_product_saves {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    let Some(product) = state
        .products
        .iter_mut()
        .find(|p| p.get("id").and_then(Value::as_i64) == Some(i64::from(id)))
    else {
        return message(StatusCode::NOT_FOUND, "Product not found!");
    };
    let mut updated = body;
    updated["id"] = json!(id);
    *product = updated;
    message(StatusCode::OK, "Product updated successfully!")
}

async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Seller) {
        return response;
    }
    let before = state.products.len();
    state
        .products
        .retain(|p| p.get("id").and_then(Value::as_i64) != Some(i64::from(id)));
    if state.products.len() == before {
        return message(StatusCode::NOT_FOUND, "Product not found!");
    }
    message(StatusCode::OK, "Product deleted successfully!")
}

async fn eco_scores(State(state): State<SharedState>) -> Response {
    let state = lock(&state);
    let scores: Vec<Value> = state
        .products
        .iter()
        .filter_map(|p| {
            Some(json!({
                "productId": p.get("id")?,
                "productName": p.get("name")?,
                "value": p.get("eco_score").filter(|v| !v.is_null())?,
            }))
        })
        .collect();
    Json(json!({ "scores": scores })).into_response()
}

async fn dynamic_pricing() -> Response {
    Json(json!({ "dynamic_price": 19.99 })).into_response()
}

// =============================================================================
// Recycle program
// =============================================================================

async fn submit_recycle(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match identity(&state, &headers) {
        Ok((id, _)) => id,
        Err(response) => return response,
    };
    let id = state.next_id();
    state.recycle_items.push(json!({
        "id": id,
        "user_id": user_id,
        "product_name": field(&body, "product_name"),
        "material": field(&body, "material"),
        "condition": field(&body, "condition"),
        "description": field(&body, "description"),
        "status": "Pending",
        "date_submitted": "Sat, 18 Oct 2025 10:00:00 GMT",
    }));
    message(StatusCode::CREATED, "Recycle item submitted successfully!")
}

fn public_item(item: &Value) -> Value {
    let mut item = item.clone();
    if let Some(object) = item.as_object_mut() {
        object.remove("user_id");
    }
    item
}

async fn recycle_items(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user_id = match identity(&state, &headers) {
        Ok((id, _)) => id,
        Err(response) => return response,
    };
    let items: Vec<Value> = state
        .recycle_items
        .iter()
        .filter(|item| item.get("user_id").and_then(Value::as_i64) == Some(i64::from(user_id)))
        .map(public_item)
        .collect();
    Json(items).into_response()
}

async fn vouchers(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user_id = match identity(&state, &headers) {
        Ok((id, _)) => id,
        Err(response) => return response,
    };
    let vouchers: Vec<Value> = state
        .vouchers
        .iter()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, voucher)| voucher.clone())
        .collect();
    Json(vouchers).into_response()
}

async fn eco_points(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = identity(&state, &headers) {
        return response;
    }
    Json(json!({ "points": state.eco_points })).into_response()
}

// =============================================================================
// Admin
// =============================================================================

async fn admin_recycle_items(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Admin) {
        return response;
    }
    let pending: Vec<Value> = state
        .recycle_items
        .iter()
        .filter(|item| field(item, "status") == "Pending")
        .map(public_item)
        .collect();
    Json(pending).into_response()
}

async fn decide_recycle_item(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Admin) {
        return response;
    }
    let status = field(&body, "status").to_string();
    if status != "Approved" && status != "Rejected" {
        return message(StatusCode::BAD_REQUEST, "Invalid status!");
    }
    let Some(item) = state
        .recycle_items
        .iter_mut()
        .find(|item| item.get("id").and_then(Value::as_i64) == Some(i64::from(id)))
    else {
        return message(StatusCode::NOT_FOUND, "Item not found!");
    };
    item["status"] = json!(status);
    let owner = item
        .get("user_id")
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .unwrap_or_default();

    if status == "Approved" {
        let code = format!("GREEN{id:05}");
        state.vouchers.push((
            owner,
            json!({
                "code": code,
                "discount_value": 15.0,
                "valid_until": "Mon, 17 Nov 2025 10:00:00 GMT",
                "is_redeemed": false,
            }),
        ));
    }
    message(StatusCode::OK, &format!("Item {status} successfully!"))
}

async fn admin_users(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Admin) {
        return response;
    }
    let users: Vec<Value> = state
        .users
        .iter()
        .map(|u| json!({ "id": u.id, "username": u.username, "role": u.role }))
        .collect();
    Json(users).into_response()
}

async fn admin_products(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = require(&state, &headers, Role::Admin) {
        return response;
    }
    Json(Value::Array(state.products.clone())).into_response()
}
