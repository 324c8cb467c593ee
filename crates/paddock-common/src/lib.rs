//! Paddock Common Library
//!
//! Shared error handling and logging for the Paddock workspace.
//!
//! # Overview
//!
//! This crate provides the functionality used across all Paddock members:
//!
//! - **Error Handling**: the workspace-level error and result types
//! - **Logging**: tracing subscriber setup with console/file targets
//!
//! # Example
//!
//! ```no_run
//! use paddock_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("started");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{PaddockError, Result};
