//! Green Street Market client core.
//!
//! Holds the shopper-facing state of the marketplace: the persistent store
//! adapter, the cart, the session state machine, the route access gate and
//! the backend API client. [`app::App`] ties them together.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use green_street_storefront::app::App;
//! use green_street_storefront::store::FileStore;
//!
//! let mut app = App::start(Arc::new(FileStore::new(&config.state_path)));
//! app.restore();
//! let navigation = app.navigate("/dashboard");
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod cart;
pub mod config;
pub mod error;
pub mod router;
pub mod session;
pub mod store;
