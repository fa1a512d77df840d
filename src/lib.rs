//! TrailMap - trail discovery core
//!
//! The storage and simulation core of the TrailMap app: a versioned SQLite
//! trail store with ordered, atomic schema migrations, repositories for
//! trails, reviews and completions, and a playback engine that replays a
//! trail's recorded path as a timed position feed.

pub mod geo;
pub mod playback;
pub mod session;
pub mod storage;
pub mod trails;

// Re-export commonly used types
pub use geo::{distance, GeoPoint, TrailPath};
pub use playback::PlaybackEngine;
pub use session::TrailSession;
pub use storage::{Database, StoreError};
