//! Paddock Ingest - racing data ingestion and synchronization
//!
//! Pulls nested meeting/event/selection payloads from the racing data
//! provider, flattens them into wide relational rows, and merges them
//! idempotently into Postgres. One bad date, meeting, or event never aborts
//! a run; every write converges on repeat ingestion.

pub mod config;
pub mod db;
pub mod flatten;
pub mod provider;
pub mod sync;

pub use config::Config;
pub use sync::{RunSummary, Synchronizer};
