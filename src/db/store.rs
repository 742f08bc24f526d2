//! SQLite-backed store for users and notes.
//!
//! Tables:
//! - `users`: id (uuid), name, email (unique), password_hash, salt, created_at
//! - `notes`: id (autoincrement), title, content, category, status,
//!   created_at, updated_at, user_id → users.id ON DELETE CASCADE
//!
//! Every note query filters by `user_id` as well as the note id, so a
//! caller can never see or mutate another user's rows.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::password;
use crate::error::{JotterError, Result};

/// Pool size. WAL mode lets reads run in parallel while SQLite's own
/// page lock + busy_timeout serialise the writes.
const POOL_MAX_CONNECTIONS: u32 = 8;

/// Category assigned when a note is created without one.
pub const DEFAULT_CATEGORY: &str = "Personal";

// ── Row types ───────────────────────────────────────────────────────

/// Lifecycle state of a note, independent of its category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Active,
    Pinned,
    Archived,
}

impl NoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Pinned => "pinned",
            Self::Archived => "archived",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "pinned" => Self::Pinned,
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

/// A registered user. Never carries the password hash; callers that need
/// it go through [`Store::authenticate_user`].
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A note owned by a single user.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

// ── SQLite store ────────────────────────────────────────────────────

/// Pooled SQLite store. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Pragmas run per connection: foreign_keys is connection-local,
        // and the cascade from users to notes depends on it.
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Pool::builder().max_size(POOL_MAX_CONNECTIONS).build(manager)?;

        let conn = pool.get()?;
        Self::init_schema(&conn)?;

        Ok(Self { pool })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                email         TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                salt          TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                title      TEXT NOT NULL,
                content    TEXT NOT NULL,
                category   TEXT NOT NULL DEFAULT 'Personal',
                status     TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);",
        )?;
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Register a new user. The password is salted and stretched before
    /// it touches the database.
    pub fn create_user(&self, name: &str, email: &str, pass: &str) -> Result<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || pass.is_empty() {
            return Err(JotterError::Validation(
                "Name, email and password are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(JotterError::Validation("Invalid email address".into()));
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let salt = password::generate_salt();
        let password_hash = password::hash_password(pass, &salt);
        let now = Utc::now();

        let conn = self.pool.get()?;
        let result = conn.execute(
            "INSERT INTO users (id, name, email, password_hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, name, email, password_hash, salt, now.to_rfc3339()],
        );

        match result {
            Ok(_) => Ok(User {
                id: user_id,
                name: name.to_string(),
                email,
                created_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(JotterError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticate by email + password. Unknown email and wrong password
    /// produce the same error, and both take one hashing round.
    pub fn authenticate_user(&self, email: &str, pass: &str) -> Result<User> {
        let email = normalize_email(email);

        let conn = self.pool.get()?;
        let row: std::result::Result<(String, String, String, String, String), _> = conn
            .query_row(
                "SELECT id, name, password_hash, salt, created_at FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            );

        match row {
            Ok((id, name, stored_hash, salt, created_at)) => {
                if !password::verify_password(pass, &salt, &stored_hash) {
                    return Err(JotterError::InvalidCredentials);
                }
                Ok(User {
                    id,
                    name,
                    email,
                    created_at: parse_timestamp(&created_at),
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                // Dummy hash to prevent a timing side-channel
                password::dummy_verify(pass);
                Err(JotterError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user by id.
    pub fn user_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let row = conn.query_row(
            "SELECT id, name, email, created_at FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_timestamp(&row.get::<_, String>(3)?),
                })
            },
        );

        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a user. Their notes go with them via the schema cascade.
    pub fn delete_user(&self, user_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(deleted > 0)
    }

    // ── Notes ───────────────────────────────────────────────────────

    /// Create a note for `user_id`. Category defaults to
    /// [`DEFAULT_CATEGORY`]; status starts as `active`.
    pub fn create_note(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        category: Option<&str>,
    ) -> Result<Note> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(JotterError::Validation(
                "Title and content are required".into(),
            ));
        }
        let category = match category.map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_CATEGORY,
        };
        let now = Utc::now();

        let conn = self.pool.get()?;
        let result = conn.execute(
            "INSERT INTO notes (title, content, category, status, created_at, updated_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                title,
                content,
                category,
                NoteStatus::Active.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
                user_id,
            ],
        );

        match result {
            Ok(_) => Ok(Note {
                id: conn.last_insert_rowid(),
                title: title.to_string(),
                content: content.to_string(),
                category: category.to_string(),
                status: NoteStatus::Active,
                created_at: now,
                updated_at: now,
                user_id: user_id.to_string(),
            }),
            // Only the user_id FK can fire here: the owning account is
            // gone but a stateless token for it still verifies.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(JotterError::NotFound("User"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List all notes owned by `user_id`, oldest first.
    pub fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, content, category, status, created_at, updated_at, user_id
             FROM notes WHERE user_id = ?1 ORDER BY id",
        )?;
        let notes = stmt
            .query_map(params![user_id], note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Fetch a single note. `None` if it does not exist or belongs to
    /// someone else.
    pub fn get_note(&self, user_id: &str, note_id: i64) -> Result<Option<Note>> {
        let conn = self.pool.get()?;
        let row = conn.query_row(
            "SELECT id, title, content, category, status, created_at, updated_at, user_id
             FROM notes WHERE id = ?1 AND user_id = ?2",
            params![note_id, user_id],
            note_from_row,
        );

        match row {
            Ok(note) => Ok(Some(note)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite a note's title, content and category, refresh `updated_at`,
    /// and optionally move it to a new status. Returns the updated row, or
    /// `None` when no owned note matched.
    pub fn update_note(
        &self,
        user_id: &str,
        note_id: i64,
        title: &str,
        content: &str,
        category: &str,
        status: Option<NoteStatus>,
    ) -> Result<Option<Note>> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(JotterError::Validation(
                "Title and content are required".into(),
            ));
        }

        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE notes
             SET title = ?1, content = ?2, category = ?3,
                 status = COALESCE(?4, status), updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                title,
                content,
                category,
                status.map(|s| s.as_str().to_string()),
                Utc::now().to_rfc3339(),
                note_id,
                user_id,
            ],
        )?;
        drop(conn);

        if updated == 0 {
            return Ok(None);
        }
        self.get_note(user_id, note_id)
    }

    /// Delete a note. Returns whether a row was removed; deleting an
    /// absent or foreign note is a no-op.
    pub fn delete_note(&self, user_id: &str, note_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![note_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Set a note's status (pin/archive), leaving its category untouched.
    /// Idempotent; returns whether an owned note matched.
    pub fn set_note_status(
        &self,
        user_id: &str,
        note_id: i64,
        status: NoteStatus,
    ) -> Result<bool> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE notes SET status = ?1 WHERE id = ?2 AND user_id = ?3",
            params![status.as_str(), note_id, user_id],
        )?;
        Ok(updated > 0)
    }
}

// ── Row helpers ─────────────────────────────────────────────────────

fn note_from_row(row: &rusqlite::Row) -> std::result::Result<Note, rusqlite::Error> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        status: NoteStatus::from_str_lossy(&row.get::<_, String>(4)?),
        created_at: parse_timestamp(&row.get::<_, String>(5)?),
        updated_at: parse_timestamp(&row.get::<_, String>(6)?),
        user_id: row.get(7)?,
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ── Tests ───────────────────────────────────────────────────────────
