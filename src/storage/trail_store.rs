//! Trail repository.
//!
//! Listing reads scalar columns only. Fetching a single trail decodes its
//! point and path columns and rejects anything malformed.

use crate::geo::{GeoPoint, PathError, TrailPath};
use crate::storage::database::{map_sqlite, StoreError};
use crate::trails::{Difficulty, Trail, TrailId, TrailLocation, TrailMetrics, TrailSummary};
use rusqlite::{params, Connection, Row};

const SUMMARY_COLUMNS: &str = r#""id", "name", "difficulty", "length", "duration", "elevation",
    "downhill", "description", "image", "city", "region", "province", "state""#;

/// Read access to trails.
pub struct TrailStore<'a> {
    conn: &'a Connection,
}

impl<'a> TrailStore<'a> {
    /// Create a new trail store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List every trail, ordered by id.
    pub fn list_trails(&self) -> Result<Vec<TrailSummary>, StoreError> {
        let sql = format!(r#"SELECT {} FROM "Trail" ORDER BY "id""#, SUMMARY_COLUMNS);
        self.query_summaries(&sql, params![])
    }

    /// Case-insensitive substring search over name and location fields.
    pub fn search_trails(&self, query: &str) -> Result<Vec<TrailSummary>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM "Trail"
               WHERE "name" LIKE ?1 ESCAPE '\' OR "city" LIKE ?1 ESCAPE '\'
                  OR "region" LIKE ?1 ESCAPE '\' OR "province" LIKE ?1 ESCAPE '\'
                  OR "state" LIKE ?1 ESCAPE '\'
               ORDER BY "id""#,
            SUMMARY_COLUMNS
        );
        let pattern = format!("%{}%", escape_like(query.trim()));
        self.query_summaries(&sql, params![pattern])
    }

    pub fn count_trails(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row(r#"SELECT COUNT(*) FROM "Trail""#, [], |row| row.get(0))
            .map_err(|e| map_sqlite(e, "trail count"))?;
        Ok(count as usize)
    }

    /// Get a trail with its decoded path.
    pub fn get_trail(&self, id: TrailId) -> Result<Trail, StoreError> {
        let sql = format!(
            r#"SELECT {}, "startpoint", "path", "endpoint" FROM "Trail" WHERE "id" = ?1"#,
            SUMMARY_COLUMNS
        );

        let result = self.conn.query_row(&sql, params![id.0], |row| {
            Ok((
                summary_from_row(row)?,
                row.get::<_, String>(13)?,
                row.get::<_, String>(14)?,
                row.get::<_, String>(15)?,
            ))
        });

        let (summary, start_text, path_text, end_text) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(StoreError::NotFound(format!("Trail {}", id)))
            }
            Err(e) => return Err(map_sqlite(e, "trail")),
        };

        let start_point =
            GeoPoint::decode(&start_text).map_err(|e| malformed(id, "startpoint", e))?;
        let end_point = GeoPoint::decode(&end_text).map_err(|e| malformed(id, "endpoint", e))?;
        let path = TrailPath::decode(&path_text).map_err(|e| malformed(id, "path", e))?;

        if path.first() != start_point {
            return Err(malformed_reason(
                id,
                "path",
                format!("first point {} differs from start {}", path.first(), start_point),
            ));
        }
        if path.last() != end_point {
            return Err(malformed_reason(
                id,
                "path",
                format!("last point {} differs from end {}", path.last(), end_point),
            ));
        }

        Ok(Trail {
            summary,
            start_point,
            end_point,
            path,
        })
    }

    fn query_summaries(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<TrailSummary>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| map_sqlite(e, "trail list"))?;

        let rows = stmt
            .query_map(params, summary_from_row)
            .map_err(|e| map_sqlite(e, "trail list"))?;

        let mut trails = Vec::new();
        for row in rows {
            trails.push(row.map_err(|e| map_sqlite(e, "trail list"))?);
        }

        Ok(trails)
    }
}

/// Escape `LIKE` wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Map the leading `SUMMARY_COLUMNS` of a row.
fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<TrailSummary> {
    let difficulty: String = row.get(2)?;
    Ok(TrailSummary {
        id: TrailId(row.get(0)?),
        name: row.get(1)?,
        difficulty: Difficulty::from_label(&difficulty),
        metrics: TrailMetrics {
            length: row.get(3)?,
            duration: row.get(4)?,
            elevation: row.get(5)?,
            downhill: row.get(6)?,
        },
        description: row.get(7)?,
        image: row.get(8)?,
        location: TrailLocation {
            city: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            region: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
            province: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
            state: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        },
    })
}

fn malformed(id: TrailId, field: &str, e: PathError) -> StoreError {
    malformed_reason(id, field, e.to_string())
}

fn malformed_reason(id: TrailId, field: &str, reason: String) -> StoreError {
    tracing::warn!("Trail {} has malformed {}: {}", id, field, reason);
    StoreError::MalformedData {
        field: format!("Trail {} {}", id, field),
        reason,
    }
}
