//! Admin commands.

use green_street_core::{RecycleDecision, RecycleItemId, Role};
use green_street_storefront::error::AppError;

use super::Context;

/// List recycle submissions awaiting review.
///
/// # Errors
///
/// Returns `AppError` unless an admin is logged in.
pub async fn recycle_items(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Admin)?;
    let result = ctx.client.admin_recycle_items(&credential).await;
    let items = ctx.app.authorized(ticket, result)?;
    if items.is_empty() {
        tracing::info!("Nothing awaiting review");
    }
    for item in items {
        tracing::info!(
            "#{} {} ({}, {}) submitted {}",
            item.id,
            item.product_name,
            item.material,
            item.condition,
            item.date_submitted.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Approve or reject a submission.
///
/// # Errors
///
/// Returns `AppError` unless an admin is logged in.
pub async fn decide(
    ctx: &mut Context,
    id: RecycleItemId,
    decision: RecycleDecision,
) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Admin)?;
    let result = ctx.client.decide_recycle_item(&credential, id, decision).await;
    let message = ctx.app.authorized(ticket, result)?;
    tracing::info!("{message}");
    Ok(())
}

/// List users.
///
/// # Errors
///
/// Returns `AppError` unless an admin is logged in.
pub async fn users(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Admin)?;
    let result = ctx.client.admin_users(&credential).await;
    for user in ctx.app.authorized(ticket, result)? {
        tracing::info!("#{} {} ({})", user.id, user.username, user.role);
    }
    Ok(())
}

/// List every product.
///
/// # Errors
///
/// Returns `AppError` unless an admin is logged in.
pub async fn products(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Admin)?;
    let result = ctx.client.admin_products(&credential).await;
    for product in ctx.app.authorized(ticket, result)? {
        tracing::info!("#{} {} ${}", product.id, product.name, product.price);
    }
    Ok(())
}
