//! Core data types for the storage layer.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Kind of a GitHub activity event, limited to the tracked allow-list.
///
/// This is a closed set: feed descriptors whose `type` tag is not one of
/// these variants are discarded at the ingestion boundary and never reach
/// storage. The string forms match the upstream `type` values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
pub enum EventKind {
    /// Someone starred a repository.
    #[serde(rename = "WatchEvent")]
    #[strum(serialize = "WatchEvent")]
    Watch,
    /// Pull request opened, closed, merged, etc.
    #[serde(rename = "PullRequestEvent")]
    #[strum(serialize = "PullRequestEvent")]
    PullRequest,
    /// Issue opened, closed, reopened, etc.
    #[serde(rename = "IssuesEvent")]
    #[strum(serialize = "IssuesEvent")]
    Issue,
}

impl EventKind {
    /// The full allow-list, in declaration order.
    pub const ALL: [EventKind; 3] = [EventKind::Watch, EventKind::PullRequest, EventKind::Issue];
}

/// One persisted activity event.
///
/// Records are created once by the collector and never mutated. `observed_at`
/// is the collection timestamp, taken once per cycle, not the upstream
/// event's own timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Row id assigned by the store on insert; `None` until persisted.
    pub id: Option<i64>,
    /// Repository the event is about, e.g. "octocat/Hello-World".
    pub repo_name: String,
    /// Event kind; always a member of the allow-list.
    pub kind: EventKind,
    /// Epoch seconds at which the collector recorded the event.
    pub observed_at: i64,
}

impl EventRecord {
    /// Create a record pending insertion.
    pub fn new(repo_name: impl Into<String>, kind: EventKind, observed_at: i64) -> Self {
        Self {
            id: None,
            repo_name: repo_name.into(),
            kind,
            observed_at,
        }
    }
}
