//! Storage Layer
//!
//! SQLite event log with async read/write separation:
//! - **Writer**: dedicated thread with exclusive write connection, fed by an
//!   MPSC command channel; one transaction per collection cycle
//! - **Readers**: connection pool for concurrent count queries
//!
//! # Components
//!
//! - [`StorageWriter`]: batch append facade used by the collector
//! - [`EventCountReader`]: per-kind count queries used by the query service
//! - [`StorageBuilder`] / [`StorageHandles`]: initialization and lifecycle

mod actor;
mod builder;
mod error;
mod facades;
mod pool;
mod schema;
mod types;

pub use builder::{StorageBuilder, StorageHandles};
pub use error::StorageError;
pub use facades::{EventCountReader, StorageWriter};
pub use types::{EventKind, EventRecord};
