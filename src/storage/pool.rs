//! Reader connection pool using r2d2.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::storage::StorageError;

/// Connection pool for concurrent read operations.
pub struct ReadPool {
    pool: Pool<SqliteConnectionManager>,
}

impl ReadPool {
    /// Create a new read pool.
    ///
    /// Note: Schema is expected to be initialized by the writer actor before
    /// this is called.
    pub fn new(db_path: &Path, size: u32) -> Result<Arc<Self>, StorageError> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
        let pool = Pool::builder().max_size(size).build(manager)?;

        Ok(Arc::new(Self { pool }))
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        Ok(self.pool.get()?)
    }
}
