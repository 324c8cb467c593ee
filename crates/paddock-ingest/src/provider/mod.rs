//! Provider API boundary
//!
//! The provider exposes persisted GraphQL operations over HTTP GET plus a
//! REST odds endpoint. Everything here is read-only and safe to repeat.

pub mod client;
pub mod types;
pub mod window;

pub use client::{FetchError, ProviderClient};
