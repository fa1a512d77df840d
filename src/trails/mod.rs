//! Trail domain records.

pub mod types;

pub use types::{
    CompletionId, Difficulty, Review, ReviewId, Trail, TrailCompletion, TrailId, TrailLocation,
    TrailMetrics, TrailSummary, User, UserId,
};
