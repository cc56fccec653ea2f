//! Seller product management commands.

use green_street_core::{ProductDraft, ProductId, Role};
use green_street_storefront::error::AppError;

use super::Context;

/// List products.
///
/// # Errors
///
/// Returns `AppError` unless a seller is logged in.
pub async fn list(ctx: &mut Context) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Seller)?;
    let result = ctx.client.seller_products(&credential).await;
    let products = ctx.app.authorized(ticket, result)?;
    if products.is_empty() {
        tracing::info!("No products yet");
    }
    for product in products {
        let score = product
            .eco_score
            .map_or_else(|| "-".to_string(), |score| score.to_string());
        tracing::info!("#{} {} ${} eco {score}", product.id, product.name, product.price);
    }
    Ok(())
}

/// Score a draft, then create or update the product.
///
/// # Errors
///
/// Returns `AppError` unless a seller is logged in and both steps succeed.
pub async fn save(
    ctx: &mut Context,
    id: Option<ProductId>,
    draft: ProductDraft,
) -> Result<(), AppError> {
    if draft.price.is_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    let (ticket, credential) = ctx.app.require(Role::Seller)?;
    let result = match id {
        Some(id) => ctx.client.update_product(&credential, id, &draft).await,
        None => ctx.client.create_product(&credential, &draft).await,
    };
    let eco_score = ctx.app.authorized(ticket, result)?;
    match id {
        Some(id) => tracing::info!("Updated product #{id} (eco score {eco_score})"),
        None => tracing::info!("Created {} (eco score {eco_score})", draft.name),
    }
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns `AppError` unless a seller is logged in.
pub async fn delete(ctx: &mut Context, id: ProductId) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Seller)?;
    let result = ctx.client.delete_product(&credential, id).await;
    ctx.app.authorized(ticket, result)?;
    tracing::info!("Deleted product #{id}");
    Ok(())
}

/// Calculate an eco score without saving.
///
/// # Errors
///
/// Returns `AppError` unless a seller is logged in.
pub async fn score(ctx: &mut Context, draft: &ProductDraft) -> Result<(), AppError> {
    let (ticket, credential) = ctx.app.require(Role::Seller)?;
    let result = ctx.client.calculate_eco_score(&credential, draft).await;
    let eco_score = ctx.app.authorized(ticket, result)?;
    tracing::info!("Eco score for {}: {eco_score}", draft.name);
    Ok(())
}
