//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer and a
//! handles struct for accessing the facades plus lifecycle management.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::storage::actor::{Command, DbActor};
use crate::storage::pool::ReadPool;
use crate::storage::{EventCountReader, StorageError, StorageWriter};

/// Default channel capacity for writer commands.
///
/// One command per collection cycle plus shutdown; generous headroom.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Minimum connection pool size.
const MIN_POOL_SIZE: u32 = 2;

/// Maximum connection pool size.
const MAX_POOL_SIZE: u32 = 32;

/// Calculate default pool size based on available CPU parallelism.
fn default_pool_size() -> u32 {
    std::thread::available_parallelism()
        .map(|p| (p.get() as u32).clamp(MIN_POOL_SIZE, MAX_POOL_SIZE))
        .unwrap_or(4)
}

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    db_path: PathBuf,
    pool_size: u32,
    channel_capacity: usize,
}

impl StorageBuilder {
    /// Create a new storage builder.
    ///
    /// Pool size defaults to the number of available CPUs (clamped to 2-32).
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            pool_size: default_pool_size(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the connection pool size for readers.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the channel capacity for writer commands.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Build the storage layer and return handles.
    pub fn build(self) -> Result<StorageHandles, StorageError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Internal(format!(
                        "failed to create database directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        // The actor opens the database and initializes the schema before its
        // thread starts, so the pool below always finds the tables in place.
        let (actor_handle, tx) = DbActor::spawn(&self.db_path, self.channel_capacity)?;
        let pool = ReadPool::new(&self.db_path, self.pool_size)?;

        Ok(StorageHandles {
            writer: StorageWriter::new(tx.clone()),
            counts: EventCountReader::new(pool),
            tx,
            actor_handle: Some(actor_handle),
        })
    }
}

/// Handles to the storage layer facades.
pub struct StorageHandles {
    /// Write facade for the collector.
    pub writer: StorageWriter,
    /// Read facade for the query service.
    pub counts: EventCountReader,
    tx: std::sync::mpsc::SyncSender<Command>,
    actor_handle: Option<JoinHandle<()>>,
}

impl StorageHandles {
    /// Gracefully shutdown the storage layer.
    ///
    /// Sends the shutdown command to the writer actor and joins its thread.
    pub fn shutdown(mut self) -> Result<(), StorageError> {
        self.tx
            .try_send(Command::Shutdown)
            .map_err(|_| StorageError::ChannelSend)?;

        if let Some(handle) = self.actor_handle.take() {
            handle
                .join()
                .map_err(|_| StorageError::Internal("failed to join actor thread".to_string()))?;
        }

        Ok(())
    }
}

impl Drop for StorageHandles {
    fn drop(&mut self) {
        // Try graceful shutdown if not already done
        if self.actor_handle.is_some() {
            let _ = self.tx.try_send(Command::Shutdown);
            if let Some(handle) = self.actor_handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{EventKind, EventRecord};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_storage_roundtrip() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("roundtrip.db");

        let handles = StorageBuilder::new(&db_path)
            .pool_size(2)
            .channel_capacity(100)
            .build()
            .unwrap();

        handles
            .writer
            .append_events(vec![
                EventRecord::new("octocat/Hello-World", EventKind::Watch, 100),
                EventRecord::new("octocat/Hello-World", EventKind::Issue, 150),
            ])
            .await
            .unwrap();

        // Append has returned, so the batch must be visible to readers now.
        let counts = handles
            .counts
            .count_by_kind("octocat/Hello-World", 0, 1000)
            .unwrap();
        assert_eq!(counts[&EventKind::Watch], 1);
        assert_eq!(counts[&EventKind::Issue], 1);

        handles.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_reopen_existing_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");

        {
            let handles = StorageBuilder::new(&db_path).pool_size(2).build().unwrap();
            handles
                .writer
                .append_events(vec![EventRecord::new("a/b", EventKind::Watch, 100)])
                .await
                .unwrap();
            handles.shutdown().unwrap();
        }

        // Second startup runs schema init again; data must survive.
        let handles = StorageBuilder::new(&db_path).pool_size(2).build().unwrap();
        let counts = handles.counts.count_by_kind("a/b", 0, 1000).unwrap();
        assert_eq!(counts[&EventKind::Watch], 1);

        handles.shutdown().unwrap();
    }

    #[test]
    fn test_default_pool_size_within_bounds() {
        let size = super::default_pool_size();
        assert!(size >= super::MIN_POOL_SIZE);
        assert!(size <= super::MAX_POOL_SIZE);
    }
}
