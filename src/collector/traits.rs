//! Core collector traits and types.

use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Failures of a single fetch attempt against an upstream feed.
///
/// All variants are recovered locally: the cycle that hit them is abandoned
/// and the next one proceeds on schedule.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (connect, DNS, TLS, read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The fetch did not complete within the configured timeout.
    #[error("timeout elapsed")]
    Timeout,

    /// The feed answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// The response body was not the expected JSON array.
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors that can occur during collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Upstream fetch failed; retried implicitly on the next cycle.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Failed to store the cycle's batch.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Schedule for collector execution.
///
/// Supports both fixed interval and cron-based scheduling. Interval jobs fire
/// on a fixed cadence measured from each cycle's start, so a slow fetch never
/// pushes the schedule back.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed interval between cycle starts.
    ///
    /// Interval is clamped to a minimum of 1 second.
    Interval(Duration),

    /// Cron expression for scheduled execution.
    ///
    /// Uses standard cron syntax: `sec min hour day month weekday` (6-field).
    /// Example: `"0 */5 * * * *"` = every 5 minutes at second 0
    Cron(String),
}

impl Schedule {
    /// Create an interval schedule.
    ///
    /// Interval is clamped to a minimum of 1 second.
    pub fn interval(duration: Duration) -> Self {
        if duration < MIN_INTERVAL {
            tracing::warn!(min_interval = ?MIN_INTERVAL,
                "Interval duration is less than minimum allowed. Using minimum duration."
            );
            Self::Interval(MIN_INTERVAL)
        } else {
            Self::Interval(duration)
        }
    }

    /// Create a cron schedule with immediate validation.
    ///
    /// # Errors
    /// Returns `CollectorError::Config` if the cron expression is invalid.
    pub fn cron(expr: impl AsRef<str>) -> Result<Self, CollectorError> {
        use std::str::FromStr;

        let test_expr = expr.as_ref();
        cron::Schedule::from_str(test_expr)
            .map_err(|e| CollectorError::Config(format!("invalid cron expression: {e}")))?;

        Ok(Self::Cron(test_expr.to_string()))
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(d) => write!(f, "every {:?}", d),
            Self::Cron(expr) => write!(f, "cron: {}", expr),
        }
    }
}

/// Configuration trait for collectors.
pub trait CollectorConfig: Send + Sync + 'static {
    /// Unique identifier for this collector instance.
    fn name(&self) -> &str;

    /// Execution schedule (interval or cron).
    fn schedule(&self) -> Schedule;

    /// Timeout bounding each fetch attempt.
    fn timeout(&self) -> Duration;
}

/// Core collector trait.
///
/// Collectors are async and run as scheduled jobs. They hold a storage writer
/// internally and perform the whole fetch-filter-stamp-store cycle in
/// `collect()`.
///
/// # Error Handling
///
/// Any error returned from `collect()` is terminal for that cycle only: the
/// registry logs it and the job fires again on the next tick. A cycle that
/// finds no tracked events is a success, not an error.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Associated configuration type.
    type Config: CollectorConfig;

    /// Get the collector's configuration.
    fn config(&self) -> &Self::Config;

    /// Source tag for logging (e.g. "feed.github").
    fn source(&self) -> &str;

    /// Perform one collection cycle: fetch, filter, stamp, append.
    async fn collect(&self) -> Result<(), CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_interval_minimum() {
        let schedule = Schedule::interval(Duration::from_millis(100));
        match schedule {
            Schedule::Interval(d) => assert_eq!(d, MIN_INTERVAL),
            _ => panic!("expected Interval"),
        }
    }

    #[test]
    fn test_schedule_interval_valid() {
        let schedule = Schedule::interval(Duration::from_secs(60));
        match schedule {
            Schedule::Interval(d) => assert_eq!(d, Duration::from_secs(60)),
            _ => panic!("expected Interval"),
        }
    }

    #[test]
    fn test_schedule_cron_valid() {
        let schedule = Schedule::cron("0 */5 * * * *").unwrap();
        match schedule {
            Schedule::Cron(expr) => assert_eq!(expr, "0 */5 * * * *"),
            _ => panic!("expected Cron"),
        }
    }

    #[test]
    fn test_schedule_cron_invalid() {
        let result = Schedule::cron("not a cron");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid cron"));
    }
}
