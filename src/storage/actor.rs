//! Writer actor with dedicated connection and MPSC channel.
//!
//! Single-writer pattern: one thread owns the write connection and processes
//! commands via MPSC. Each collection cycle's batch is inserted inside one
//! transaction, so readers either see the whole batch or none of it.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::storage::schema::init_schema;
use crate::storage::types::EventRecord;
use crate::storage::StorageError;

/// Commands sent to the writer actor.
#[derive(Debug)]
pub enum Command {
    /// Insert one collection cycle's batch atomically.
    ///
    /// The reply resolves after the transaction commits; records are visible
    /// to readers only once the caller observes `Ok`.
    AppendEvents {
        events: Vec<EventRecord>,
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    /// Graceful shutdown.
    Shutdown,
}

/// Database writer actor.
pub struct DbActor {
    conn: Connection,
    rx: Receiver<Command>,
}

impl DbActor {
    /// Spawn the writer actor thread.
    ///
    /// Opens the database and initializes the schema before the thread
    /// starts, so readers created afterwards always find the tables in place.
    /// Returns the thread handle and the command sender.
    pub fn spawn(
        db_path: &Path,
        channel_capacity: usize,
    ) -> Result<(JoinHandle<()>, SyncSender<Command>), StorageError> {
        let (tx, rx) = mpsc::sync_channel(channel_capacity);
        let conn = Connection::open(db_path)?;
        init_schema(&conn)?;

        let mut actor = DbActor { conn, rx };
        let handle = thread::Builder::new()
            .name("octowatch-writer".into())
            .spawn(move || actor.run())
            .map_err(|e| StorageError::Internal(format!("failed to spawn writer thread: {e}")))?;

        Ok((handle, tx))
    }

    fn run(&mut self) {
        tracing::info!("DbActor started");

        loop {
            match self.rx.recv() {
                Ok(Command::AppendEvents { events, reply }) => {
                    let result = self.append_events(&events);
                    if let Err(e) = &result {
                        tracing::error!(error = %e, count = events.len(), "Batch append failed");
                    }
                    // The caller may have given up waiting; that is fine.
                    let _ = reply.send(result);
                }
                Ok(Command::Shutdown) => {
                    tracing::info!("DbActor shutting down");
                    break;
                }
                Err(_) => {
                    tracing::warn!("Command channel disconnected, shutting down");
                    break;
                }
            }
        }

        tracing::info!("DbActor stopped");
    }

    /// Insert a batch of records in one transaction.
    fn append_events(&mut self, events: &[EventRecord]) -> Result<(), StorageError> {
        if events.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (repo_name, event_type, event_time) VALUES (?1, ?2, ?3)",
            )?;
            for event in events {
                stmt.execute(rusqlite::params![
                    event.repo_name,
                    event.kind.as_ref(),
                    event.observed_at,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(count = events.len(), "Events batch inserted");
        Ok(())
    }
}
