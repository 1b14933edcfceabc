//! Durable persistence and the hot-path read cache sitting in front of it
//! (§4.G). `schema::migrate` provisions the tables, `Repository` is the
//! typed query surface, `KvStore` holds the flat control-flag/nonce-
//! checkpoint region, `LiveViewCache` serves the telemetry surface without
//! round-tripping SQLite on every poll, and `retention` enforces the
//! per-series retention windows.

pub mod cache;
pub mod kv;
pub mod models;
pub mod repository;
pub mod retention;
pub mod schema;

pub use cache::LiveViewCache;
pub use kv::KvStore;
pub use models::{Alert, AlertSeverity, ChainMetric, GasSample, StatsSnapshot};
pub use repository::{OpportunityFilter, Repository};
pub use retention::{sweep, RetentionPolicy};
pub use schema::migrate;
