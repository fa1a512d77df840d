//! Trail, review, completion and user records.

use crate::geo::{GeoPoint, TrailPath};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

row_id!(
    /// Row id of a trail.
    TrailId
);
row_id!(
    /// Row id of a user.
    UserId
);
row_id!(
    /// Row id of a review.
    ReviewId
);
row_id!(
    /// Row id of a completion record.
    CompletionId
);

/// Difficulty label of a trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    /// Any label this build does not know about, kept verbatim
    Other(String),
}

impl Difficulty {
    /// Parse a stored label. Never fails; unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Difficulty::Beginner,
            "intermediate" | "medium" => Difficulty::Intermediate,
            "advanced" | "hard" => Difficulty::Advanced,
            _ => Difficulty::Other(label.to_string()),
        }
    }

    /// Label as written to the store.
    pub fn label(&self) -> &str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Numeric metrics of a trail, in the units they were recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrailMetrics {
    /// Length (km)
    pub length: f64,
    /// Expected duration (hours)
    pub duration: f64,
    /// Elevation gain
    pub elevation: f64,
    /// Downhill drop
    pub downhill: f64,
}

/// Where a trail is. Every field may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrailLocation {
    pub city: String,
    pub region: String,
    pub province: String,
    pub state: String,
}

/// Scalar trail data used by list views. Never carries the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailSummary {
    pub id: TrailId,
    pub name: String,
    pub difficulty: Difficulty,
    pub metrics: TrailMetrics,
    pub description: Option<String>,
    pub image: Option<String>,
    pub location: TrailLocation,
}

/// A full trail record with its decoded path.
///
/// `path.first() == start_point` and `path.last() == end_point` hold for every
/// value handed out by the trail store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub summary: TrailSummary,
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
    pub path: TrailPath,
}

impl Trail {
    pub fn id(&self) -> TrailId {
        self.summary.id
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    /// Measured path length in meters (may differ from the recorded metric).
    pub fn path_length_meters(&self) -> f64 {
        self.path.total_length()
    }
}

/// A user's rating and comment for a trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub trail_id: TrailId,
    /// 1 to 5 inclusive
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Fact that a user traversed a trail at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailCompletion {
    pub id: CompletionId,
    pub user_id: UserId,
    pub trail_id: TrailId,
    pub completed_at: DateTime<Utc>,
}

/// A registered user. Credentials are opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// Valid review ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
