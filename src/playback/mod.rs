//! Trail playback simulation.

pub mod engine;
pub mod types;

pub use engine::{expected_duration, segment_delays, PlaybackEngine};
pub use types::{PlaybackError, PlaybackEvent, PlaybackState, RunId};
