//! User lookups. Users are created by the seed data or an external sign-up
//! flow; this store only reads them.

use crate::storage::database::{map_sqlite, StoreError};
use crate::trails::{User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Read access to users.
pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    /// Create a new user store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get a user by id.
    pub fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.conn
            .query_row(
                r#"SELECT "id", "name", "surname", "email", "password_hash", "salt"
                   FROM "User" WHERE "id" = ?1"#,
                params![id.0],
                user_from_row,
            )
            .optional()
            .map_err(|e| map_sqlite(e, "user"))?
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }

    /// Find a user by email (case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.conn
            .query_row(
                r#"SELECT "id", "name", "surname", "email", "password_hash", "salt"
                   FROM "User" WHERE lower("email") = lower(?1)"#,
                params![email.trim()],
                user_from_row,
            )
            .optional()
            .map_err(|e| map_sqlite(e, "user"))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        surname: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        salt: row.get(5)?,
    })
}
