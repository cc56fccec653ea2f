//! Recycle program, voucher and eco point commands (customer only).

use green_street_core::{NewRecycleItem, Role};
use green_street_storefront::error::AppError;

use super::Context;

/// Submit an item to the recycle program.
///
/// # Errors
///
/// Returns `AppError` unless a customer is logged in and the backend accepts
/// the submission.
pub async fn submit(
    ctx: &mut Context,
    product_name: String,
    material: String,
    condition: String,
    description: String,
) -> Result<(), AppError> {
    let item = NewRecycleItem {
        product_name,
        material,
        condition,
        description,
    };
    let (ticket, credential) = ctx.app.require(Role::Customer)?;
    let result = ctx.client.submit_recycle_item(&credential, &item).await;
    let message = ctx.app.authorized(ticket, result)?;
    tracing::info!("{message}");
    Ok(())
}

/// List the caller's submissions.
///
/// # Errors
///
/// Returns `AppError` unless a customer is logged in.
pub async fn list(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Customer)?;
    let result = ctx.client.recycle_items(&credential).await;
    let items = ctx.app.authorized(ticket, result)?;
    if items.is_empty() {
        tracing::info!("No submissions yet");
    }
    for item in items {
        tracing::info!(
            "#{} {} ({}, {}): {}",
            item.id,
            item.product_name,
            item.material,
            item.condition,
            item.status
        );
    }
    Ok(())
}

/// List unredeemed vouchers.
///
/// # Errors
///
/// Returns `AppError` unless a customer is logged in.
pub async fn vouchers(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Customer)?;
    let result = ctx.client.vouchers(&credential).await;
    let vouchers = ctx.app.authorized(ticket, result)?;
    if vouchers.is_empty() {
        tracing::info!("No vouchers");
    }
    for voucher in vouchers {
        let until = voucher
            .valid_until_parsed()
            .map_or_else(|| voucher.valid_until.clone(), |at| at.format("%Y-%m-%d").to_string());
        tracing::info!(
            "{}: {}% off, valid until {until}",
            voucher.code,
            voucher.discount_value
        );
    }
    Ok(())
}

/// Show the eco points balance.
///
/// # Errors
///
/// Returns `AppError` unless a customer is logged in.
pub async fn eco_points(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Customer)?;
    let result = ctx.client.eco_points(&credential).await;
    let points = ctx.app.authorized(ticket, result)?;
    tracing::info!("Eco points: {points}");
    Ok(())
}
