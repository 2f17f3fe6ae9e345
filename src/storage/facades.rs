//! User-facing storage facades.
//!
//! Provides ergonomic APIs for storage operations:
//! - `StorageWriter`: batch appends via the writer actor's MPSC channel
//! - `EventCountReader`: per-kind count queries over the read pool

use std::collections::BTreeMap;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::storage::actor::Command;
use crate::storage::pool::ReadPool;
use crate::storage::types::{EventKind, EventRecord};
use crate::storage::StorageError;

// =============================================================================
// Writer
// =============================================================================

/// Write facade over the actor channel.
#[derive(Clone)]
pub struct StorageWriter {
    tx: SyncSender<Command>,
}

impl std::fmt::Debug for StorageWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageWriter").finish_non_exhaustive()
    }
}

impl StorageWriter {
    pub(crate) fn new(tx: SyncSender<Command>) -> Self {
        Self { tx }
    }

    /// Append one collection cycle's batch.
    ///
    /// The batch is inserted in a single transaction; ids are assigned by the
    /// store in insertion order. Resolves only after the actor has committed,
    /// so a returned `Ok` is the point at which readers can see the records.
    pub async fn append_events(&self, events: Vec<EventRecord>) -> Result<(), StorageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .try_send(Command::AppendEvents {
                events,
                reply: reply_tx,
            })
            .map_err(|_| {
                tracing::warn!("Writer channel full or closed, dropping batch");
                StorageError::ChannelSend
            })?;

        reply_rx.await.map_err(|_| StorageError::ChannelSend)?
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Read facade answering per-kind count queries.
#[derive(Clone)]
pub struct EventCountReader {
    pool: Arc<ReadPool>,
}

impl std::fmt::Debug for EventCountReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCountReader").finish_non_exhaustive()
    }
}

impl EventCountReader {
    pub(crate) fn new(pool: Arc<ReadPool>) -> Self {
        Self { pool }
    }

    /// Count stored events per kind for one repository with `event_time` in
    /// `[from, to]` inclusive.
    ///
    /// Every allow-listed kind appears in the result; kinds with no matching
    /// records count zero. An empty range (`from > to`) yields all zeros, not
    /// an error. Fails with [`StorageError::Unavailable`] if no connection
    /// can be obtained.
    pub fn count_by_kind(
        &self,
        repo_name: &str,
        from: i64,
        to: i64,
    ) -> Result<BTreeMap<EventKind, i64>, StorageError> {
        let conn = self.pool.get()?;

        let mut counts: BTreeMap<EventKind, i64> =
            EventKind::ALL.iter().map(|kind| (*kind, 0)).collect();

        let mut stmt = conn.prepare_cached(
            "SELECT event_type, COUNT(*) FROM events
             WHERE repo_name = ?1 AND event_time BETWEEN ?2 AND ?3
             GROUP BY event_type",
        )?;
        let rows = stmt.query_map(rusqlite::params![repo_name, from, to], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (kind, count) = row?;
            match kind.parse::<EventKind>() {
                Ok(kind) => {
                    counts.insert(kind, count);
                }
                Err(_) => {
                    // Only allow-listed kinds are ever persisted; anything
                    // else means the file was written by something newer.
                    tracing::warn!(kind = %kind, "Unknown event kind in store, skipping");
                }
            }
        }

        Ok(counts)
    }
}
