//! Green Street Core - Shared types library.
//!
//! This crate provides common types used across all Green Street components:
//! - `storefront` - Client core (cart, session, access gate, API client)
//! - `cli` - Command-line shell driving the client core
//! - `integration-tests` - Mock backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, roles, credentials and the
//!   entity schemas exchanged with the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
