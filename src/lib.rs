//! octowatch: a GitHub public-events collector with a count-query API.
//!
//! The pipeline has three layers:
//!
//! - [`collector`] polls configured GitHub event feeds on a schedule,
//!   keeps only the tracked event kinds, and hands batches to storage.
//! - [`storage`] persists events through a single-writer SQLite actor and
//!   serves reads from a connection pool.
//! - [`server`] exposes the per-repository count query over HTTP.

pub mod collector;
pub mod config;
pub mod server;
pub mod storage;

pub use collector::{Collector, CollectorRegistry, GithubEventsCollector, GithubFeedConfig};
pub use config::AppConfig;
pub use server::{create_router, AppState};
pub use storage::{EventKind, EventRecord, StorageBuilder, StorageHandles};
