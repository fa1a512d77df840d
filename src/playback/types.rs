//! Playback engine types.

use crate::geo::GeoPoint;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle of a playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing has been played yet
    #[default]
    Idle,
    /// A run is moving along its path
    Running,
    /// The last run reached the final point
    Completed,
    /// The last run was cancelled before the final point
    Cancelled,
}

impl PlaybackState {
    /// Whether no run is active.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Completed | PlaybackState::Cancelled)
    }
}

/// Identifies one run of the engine. Increases with every `start`.
pub type RunId = u64;

/// Event emitted by the playback engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A run began at `path[0]`
    Started {
        run: RunId,
        total_points: usize,
        start: GeoPoint,
    },
    /// The run arrived at `path[index]`
    Position {
        run: RunId,
        index: usize,
        position: GeoPoint,
        /// Simulated time since the run started
        elapsed: Duration,
    },
    /// The run reached the last point
    Completed { run: RunId, elapsed: Duration },
    /// The run was cancelled while at `path[index]`
    Cancelled { run: RunId, index: usize },
}

impl PlaybackEvent {
    pub fn run(&self) -> RunId {
        match self {
            PlaybackEvent::Started { run, .. }
            | PlaybackEvent::Position { run, .. }
            | PlaybackEvent::Completed { run, .. }
            | PlaybackEvent::Cancelled { run, .. } => *run,
        }
    }

    /// Whether this event ends its run.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::Completed { .. } | PlaybackEvent::Cancelled { .. }
        )
    }
}

/// Errors related to playback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Path has fewer than two points
    #[error("Path too short: {0} point(s), need at least 2")]
    PathTooShort(usize),

    /// Speed is zero, negative or not finite
    #[error("Invalid speed: {0} m/s")]
    InvalidSpeed(f64),

    /// A path point is out of range
    #[error("Invalid point {index}: {reason}")]
    InvalidPoint { index: usize, reason: String },

    /// `start` was called outside a Tokio runtime
    #[error("No async runtime: {0}")]
    NoRuntime(String),
}
