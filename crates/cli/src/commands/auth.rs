//! Login, registration and session commands.

use green_street_core::Role;
use green_street_storefront::api::{LoginForm, RegisterForm};
use green_street_storefront::error::AppError;
use green_street_storefront::session::SessionState;

use super::Context;

/// Log in and report the landing page.
///
/// # Errors
///
/// Returns `AppError` if the backend refuses the login.
pub async fn login(
    ctx: &mut Context,
    username: String,
    password: String,
    role: Role,
) -> Result<(), AppError> {
    let form = LoginForm {
        username,
        password,
        role,
    };
    let landing = ctx.app.login(&ctx.client, form).await?;
    report_login(ctx, &landing.path());
    Ok(())
}

/// Log in as an admin.
///
/// # Errors
///
/// Returns `AppError` if the backend refuses the login.
pub async fn admin_login(
    ctx: &mut Context,
    username: &str,
    password: &str,
) -> Result<(), AppError> {
    let landing = ctx.app.admin_login(&ctx.client, username, password).await?;
    report_login(ctx, &landing.path());
    Ok(())
}

fn report_login(ctx: &Context, landing: &str) {
    if let Some(role) = ctx.app.session().role() {
        tracing::info!("Logged in as {role}. Landing page: {landing}");
    }
}

/// Create an account.
///
/// # Errors
///
/// Returns `AppError` if the backend refuses the registration.
pub async fn register(
    ctx: &mut Context,
    username: String,
    password: String,
    role: Role,
) -> Result<(), AppError> {
    let form = RegisterForm {
        username,
        password,
        role,
    };
    let message = ctx.app.register(&ctx.client, form).await?;
    if !message.is_empty() {
        tracing::info!("{message}");
    }
    tracing::info!("Now log in with `gsm login`.");
    Ok(())
}

pub fn logout(ctx: &mut Context) {
    let next = ctx.app.logout();
    tracing::info!("Logged out. Next page: {}", next.path());
}

pub fn whoami(ctx: &Context) {
    match ctx.app.state() {
        SessionState::Anonymous => tracing::info!("Not logged in"),
        SessionState::Authenticated { role } => match ctx.app.username() {
            Some(username) => tracing::info!("{username} ({role})"),
            None => tracing::info!("Logged in ({role})"),
        },
    }
}

/// Show the profile of the logged-in user.
///
/// # Errors
///
/// Returns `AppError::NotLoggedIn` while anonymous.
pub async fn profile(ctx: &mut Context) -> Result<(), AppError> {
    let profile = ctx.app.load_profile(&ctx.client).await?;
    tracing::info!("Username: {}", profile.username);
    if let Some(role) = profile.role {
        tracing::info!("Role: {role}");
    }
    Ok(())
}
