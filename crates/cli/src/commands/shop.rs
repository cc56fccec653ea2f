//! Browsing, cart and checkout commands.

use green_street_core::{CartItem, Price, ProductId};
use green_street_storefront::error::AppError;
use green_street_storefront::router::{DenyReason, Navigation};

use super::Context;

pub fn open(ctx: &Context, path: &str) {
    match ctx.app.navigate(path) {
        Navigation::Render(route) => tracing::info!("{} -> {route:?}", route.path()),
        Navigation::Redirect { to, reason } => {
            let why = match reason {
                DenyReason::Unauthenticated => "login required".to_string(),
                DenyReason::WrongRole { required, actual } => {
                    format!("requires {required}, logged in as {actual}")
                }
            };
            tracing::info!("Redirected to {} ({why})", to.path());
        }
    }
}

/// List products.
///
/// # Errors
///
/// Returns `AppError::Api` if the listing cannot be fetched.
pub async fn products(ctx: &Context) -> Result<(), AppError> {
    let products = ctx.client.products().await?;
    if products.is_empty() {
        tracing::info!("No products listed");
    }
    for product in products.iter() {
        match product.eco_score {
            Some(score) => tracing::info!(
                "#{} {} ${} (eco score {score})",
                product.id,
                product.name,
                product.price
            ),
            None => tracing::info!("#{} {} ${}", product.id, product.name, product.price),
        }
    }
    Ok(())
}

/// Show the eco score table.
///
/// # Errors
///
/// Returns `AppError::Api` if the table cannot be fetched.
pub async fn eco_scores(ctx: &Context) -> Result<(), AppError> {
    for entry in ctx.client.eco_scores().await? {
        tracing::info!("{}: {}", entry.product_name, entry.value);
    }
    Ok(())
}

/// Show the current dynamic price.
///
/// # Errors
///
/// Returns `AppError::Api` if the price cannot be fetched.
pub async fn dynamic_price(ctx: &Context) -> Result<(), AppError> {
    match ctx.client.dynamic_price().await? {
        Some(price) => tracing::info!("Dynamic price: ${price}"),
        None => tracing::info!("No dynamic price published"),
    }
    Ok(())
}

pub fn show_cart(ctx: &Context) {
    let cart = ctx.app.cart();
    if cart.is_empty() {
        tracing::info!("Your cart is empty");
        return;
    }
    for (position, item) in cart.items().iter().enumerate() {
        tracing::info!("{}. {} ${}", position + 1, item.name, item.price);
    }
    tracing::info!("Total: ${}", ctx.app.cart_total());
}

/// Add an item given on the command line.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a negative price.
pub fn add_item(
    ctx: &mut Context,
    id: ProductId,
    name: String,
    price: Price,
    eco_score: Option<i32>,
) -> Result<(), AppError> {
    if price.is_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    let mut item = CartItem::new(id, name, price);
    item.eco_score = eco_score;
    let count = ctx.app.add_to_cart(item).len();
    tracing::info!("Added. {count} item(s), total ${}", ctx.app.cart_total());
    Ok(())
}

/// Add a listed product by id.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if no listed product has that id.
pub async fn add_product(ctx: &mut Context, id: ProductId) -> Result<(), AppError> {
    let products = ctx.client.products().await?;
    let product = products
        .iter()
        .find(|product| product.id == id)
        .ok_or_else(|| AppError::BadRequest(format!("No product with id {id}")))?;
    let count = ctx.app.add_to_cart(CartItem::from(product)).len();
    tracing::info!(
        "Added {}. {count} item(s), total ${}",
        product.name,
        ctx.app.cart_total()
    );
    Ok(())
}

/// Remove the line item at a 1-based position.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if nothing is at that position.
pub fn remove_item(ctx: &mut Context, position: usize) -> Result<(), AppError> {
    let removed = position
        .checked_sub(1)
        .and_then(|index| ctx.app.remove_from_cart(index))
        .ok_or_else(|| AppError::BadRequest(format!("No cart item at position {position}")))?;
    tracing::info!("Removed {}. Total ${}", removed.name, ctx.app.cart_total());
    Ok(())
}

pub fn clear_cart(ctx: &mut Context) {
    ctx.app.clear_cart();
    tracing::info!("Cart emptied");
}

/// Place the order.
///
/// # Errors
///
/// Returns `AppError` unless a customer is logged in with a non-empty cart
/// and an address.
pub fn checkout(ctx: &mut Context, address: &str) -> Result<(), AppError> {
    let receipt = ctx.app.checkout(address)?;
    tracing::info!(
        "Order placed: {} item(s), ${}, shipping to {}",
        receipt.items.len(),
        receipt.total_display(),
        receipt.address
    );
    Ok(())
}
