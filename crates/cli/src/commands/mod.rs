//! CLI command implementations.

pub mod admin;
pub mod auth;
pub mod recycle;
pub mod seller;
pub mod shop;

use std::sync::Arc;

use green_street_storefront::api::ApiClient;
use green_street_storefront::app::App;
use green_street_storefront::config::ClientConfig;
use green_street_storefront::error::AppError;
use green_street_storefront::store::FileStore;

/// Everything a command needs: the app state and a backend client.
pub struct Context {
    pub app: App,
    pub client: ApiClient,
}

impl Context {
    /// Open the state file and resume any stored session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the HTTP client cannot be built.
    pub fn load(config: &ClientConfig) -> Result<Self, AppError> {
        let mut app = App::start(Arc::new(FileStore::new(&config.state_path)));
        if let Some(role) = app.restore() {
            tracing::debug!(%role, "Resumed session");
        }
        let client = ApiClient::new(config)?;
        Ok(Self { app, client })
    }
}
