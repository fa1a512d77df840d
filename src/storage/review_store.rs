//! Review and completion repository.
//!
//! Reviews and completions are append-only. Several rows per user/trail pair
//! are allowed; use `has_completed` before `mark_completed` to avoid
//! duplicates.

use crate::storage::database::{map_sqlite, StoreError};
use crate::trails::types::RATING_RANGE;
use crate::trails::{CompletionId, Review, ReviewId, TrailCompletion, TrailId, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// Review and completion store.
pub struct ReviewStore<'a> {
    conn: &'a Connection,
}

impl<'a> ReviewStore<'a> {
    /// Create a new review store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Reviews ==========

    /// Insert a review and return its id.
    ///
    /// `rating` must be within 1..=5.
    pub fn add_review(
        &self,
        user_id: UserId,
        trail_id: TrailId,
        rating: i64,
        comment: &str,
    ) -> Result<ReviewId, StoreError> {
        if !RATING_RANGE.contains(&rating) {
            return Err(StoreError::Validation(format!(
                "rating {} is outside {}..={}",
                rating,
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }

        self.conn
            .execute(
                r#"INSERT INTO "Review" ("user_id", "trail_id", "rating", "comment", "created_at")
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![
                    user_id.0,
                    trail_id.0,
                    rating,
                    comment,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(|e| map_sqlite(e, &format!("user {} or trail {}", user_id, trail_id)))?;

        let id = ReviewId(self.conn.last_insert_rowid());
        tracing::info!(
            "Review {} added for trail {} by user {} ({} stars)",
            id,
            trail_id,
            user_id,
            rating
        );
        Ok(id)
    }

    /// Reviews for a trail, oldest first.
    pub fn reviews_for_trail(&self, trail_id: TrailId) -> Result<Vec<Review>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT "id", "user_id", "trail_id", "rating", "comment", "created_at"
                   FROM "Review" WHERE "trail_id" = ?1 ORDER BY "id""#,
            )
            .map_err(|e| map_sqlite(e, "reviews"))?;

        let rows = stmt
            .query_map(params![trail_id.0], |row| {
                Ok((
                    ReviewId(row.get(0)?),
                    UserId(row.get(1)?),
                    TrailId(row.get(2)?),
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| map_sqlite(e, "reviews"))?;

        let mut reviews = Vec::new();
        for row in rows {
            let (id, user_id, trail_id, rating, comment, created_at) =
                row.map_err(|e| map_sqlite(e, "reviews"))?;
            let rating = u8::try_from(rating)
                .ok()
                .filter(|r| RATING_RANGE.contains(&i64::from(*r)))
                .ok_or_else(|| StoreError::MalformedData {
                    field: format!("Review {} rating", id),
                    reason: format!("{} is outside 1..=5", rating),
                })?;
            reviews.push(Review {
                id,
                user_id,
                trail_id,
                rating,
                comment,
                created_at: parse_timestamp(&created_at, "Review", id.0)?,
            });
        }

        Ok(reviews)
    }

    /// Mean rating of a trail, `None` without reviews.
    pub fn average_rating(&self, trail_id: TrailId) -> Result<Option<f64>, StoreError> {
        self.conn
            .query_row(
                r#"SELECT AVG("rating") FROM "Review" WHERE "trail_id" = ?1"#,
                params![trail_id.0],
                |row| row.get(0),
            )
            .map_err(|e| map_sqlite(e, "average rating"))
    }

    // ========== Completions ==========

    /// Record that a user completed a trail.
    pub fn mark_completed(
        &self,
        user_id: UserId,
        trail_id: TrailId,
    ) -> Result<CompletionId, StoreError> {
        self.conn
            .execute(
                r#"INSERT INTO "TrailCompletion" ("user_id", "trail_id", "completed_at")
                   VALUES (?1, ?2, ?3)"#,
                params![user_id.0, trail_id.0, Utc::now().to_rfc3339()],
            )
            .map_err(|e| map_sqlite(e, &format!("user {} or trail {}", user_id, trail_id)))?;

        let id = CompletionId(self.conn.last_insert_rowid());
        tracing::info!("Trail {} completed by user {}", trail_id, user_id);
        Ok(id)
    }

    /// Whether the user has at least one completion of the trail.
    pub fn has_completed(&self, user_id: UserId, trail_id: TrailId) -> Result<bool, StoreError> {
        self.conn
            .query_row(
                r#"SELECT EXISTS(SELECT 1 FROM "TrailCompletion"
                   WHERE "user_id" = ?1 AND "trail_id" = ?2)"#,
                params![user_id.0, trail_id.0],
                |row| row.get(0),
            )
            .map_err(|e| map_sqlite(e, "completion lookup"))
    }

    /// Completions of a user, oldest first.
    pub fn completions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TrailCompletion>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT "id", "user_id", "trail_id", "completed_at"
                   FROM "TrailCompletion" WHERE "user_id" = ?1 ORDER BY "id""#,
            )
            .map_err(|e| map_sqlite(e, "completions"))?;

        let rows = stmt
            .query_map(params![user_id.0], |row| {
                Ok((
                    CompletionId(row.get(0)?),
                    UserId(row.get(1)?),
                    TrailId(row.get(2)?),
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| map_sqlite(e, "completions"))?;

        let mut completions = Vec::new();
        for row in rows {
            let (id, user_id, trail_id, completed_at) =
                row.map_err(|e| map_sqlite(e, "completions"))?;
            completions.push(TrailCompletion {
                id,
                user_id,
                trail_id,
                completed_at: parse_timestamp(&completed_at, "TrailCompletion", id.0)?,
            });
        }

        Ok(completions)
    }
}

fn parse_timestamp(text: &str, table: &str, id: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::MalformedData {
            field: format!("{} {} timestamp", table, id),
            reason: e.to_string(),
        })
}
