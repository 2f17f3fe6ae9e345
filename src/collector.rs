//! Collector Layer
//!
//! Poll-fetch-filter-store framework. Each collector runs as a scheduled job
//! that performs one collection cycle per tick and appends the cycle's batch
//! to storage. A failed cycle is logged and retried implicitly on the next
//! tick; errors never stop a job or the process.
//!
//! # Architecture
//!
//! - [`Collector`]: core trait for implementing feed collectors
//! - [`Schedule`]: execution schedule (interval or cron)
//! - [`CollectorRegistry`]: job lifecycle and graceful shutdown
//! - [`GithubEventsCollector`]: poller for the GitHub public events feed

pub mod github;
mod registry;
mod traits;

pub use github::{GithubEventsCollector, GithubFeedConfig};
pub use registry::{CollectorRegistry, JobInfo, DEFAULT_SHUTDOWN_TIMEOUT};
pub use traits::{Collector, CollectorConfig, CollectorError, FetchError, Schedule, MIN_INTERVAL};
