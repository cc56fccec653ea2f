//! Persistent key/value store adapter.
//!
//! The storefront persists exactly two values across restarts: the bearer
//! credential and the serialized cart. Both go through [`KeyValueStore`],
//! which is injected into the cart and session layers rather than reached
//! through ambient global state.
//!
//! # Failure policy
//!
//! Store operations return `Result`, but callers in this crate never let a
//! store failure escape to the user: a failed read degrades to "absent", a
//! failed write is logged at `warn` and the prior persisted value is left
//! as it was. In-memory state stays authoritative either way.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys used in the persistent store.
pub mod keys {
    /// Key for the bearer credential.
    pub const TOKEN: &str = "token";

    /// Key for the serialized cart.
    pub const CART_ITEMS: &str = "cartItems";
}

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The store refused the operation (quota, poisoned lock, read-only).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key/value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write did not happen. The previous value
    /// must still be readable in that case.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Store handle shared by the cart and session layers.
pub type SharedStore = Arc<dyn KeyValueStore>;
