//! Core types for Green Street Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod entity;
pub mod id;
pub mod price;
pub mod status;

pub use credential::{Credential, CredentialError, TokenClaims};
pub use entity::*;
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;
