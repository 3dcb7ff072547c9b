//! Offline sleep queue for the `mindful` client.
//!
//! Sleep logs that could not reach the API are kept in `sleep-queue.json`
//! and replayed in order once the server answers again. The server upserts
//! per night and the queue collapses entries per date, so a replay that
//! repeats an already-accepted night is harmless.

pub mod queue;
pub mod transport;

use thiserror::Error;

pub use queue::{EnqueueOutcome, FlushOutcome, PendingSleep, SleepQueue, SyncReport, QUEUE_FILE};
pub use transport::{HttpSleepTransport, SleepTransport};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("not authenticated")]
    Unauthorized,

    #[error("rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl SyncError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized,
            408 | 429 => Self::Server { status, message },
            400..=499 => Self::Rejected { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// Worth retrying later with the same payload.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(SyncError::from_status(401, ""), SyncError::Unauthorized));
        assert!(SyncError::from_status(503, "down").is_transient());
        assert!(SyncError::from_status(429, "slow down").is_transient());
        assert!(SyncError::from_status(408, "").is_transient());

        let rejected = SyncError::from_status(400, "hours: must be greater than 0");
        assert!(matches!(rejected, SyncError::Rejected { status: 400, .. }));
        assert!(!rejected.is_transient());
        assert!(!SyncError::Unauthorized.is_transient());
    }
}
