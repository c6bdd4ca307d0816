//! Account tables: users, sessions, reset tokens, favorites, notes, and
//! export tasks.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use sha2::{Digest, Sha256};

use crate::sqlite::PatentStore;
use crate::types::*;
use patlas_core::{Error, Result};

/// Session lifetime: 30 days.
pub const SESSION_TTL_SECS: i64 = 30 * 24 * 3600;
/// Reset token lifetime: 1 hour.
pub const RESET_TTL_SECS: i64 = 3600;

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

impl PatentStore {
    /// Seed the root admin account on first open.
    pub(crate) fn seed_root_admin(conn: &Connection) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = 'root' LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        if exists.is_none() {
            conn.execute(
                "INSERT INTO users (username, password_hash, display_name, role, created_at) \
                 VALUES ('root', ?1, 'Administrator', 'admin', ?2)",
                params![hash_password("123456"), now_secs()],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Users & sessions
    // ---------------------------------------------------------------

    /// Create a user. Duplicate usernames map to `Error::Duplicate`.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        email: Option<&str>,
        role: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "INSERT INTO users (username, password_hash, display_name, email, role, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                username,
                hash_password(password),
                display_name,
                email,
                role,
                now_secs(),
            ])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::Duplicate(username.to_string())
                } else {
                    Error::Database(e.to_string())
                }
            })
        })
    }

    /// Check credentials against an active account.
    pub fn verify_login(&self, username: &str, password: &str) -> Result<Option<AuthUser>> {
        self.with_conn(|conn| {
            let row: Option<(i64, String, Option<String>, String, String)> = conn
                .prepare_cached(
                    "SELECT id, username, display_name, role, password_hash \
                     FROM users WHERE username = ?1 AND status = 1 LIMIT 1",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![username], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;

            Ok(row.and_then(|(id, username, display_name, role, stored_hash)| {
                if stored_hash == hash_password(password) {
                    Some(AuthUser {
                        id,
                        username,
                        display_name,
                        role,
                    })
                } else {
                    None
                }
            }))
        })
    }

    /// Record a session token for a user.
    pub fn create_session(&self, user_id: i64, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            let now = now_secs();
            conn.prepare_cached(
                "INSERT INTO user_sessions (user_id, token, created_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![user_id, token, now, now + SESSION_TTL_SECS])
            .map_err(|e| Error::Database(e.to_string()))?;
            Ok(())
        })
    }

    /// Resolve a bearer token to its user, honoring expiry.
    pub fn session_user(&self, token: &str) -> Result<Option<AuthUser>> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "SELECT u.id, u.username, u.display_name, u.role \
                 FROM user_sessions s JOIN users u ON s.user_id = u.id \
                 WHERE s.token = ?1 AND (s.expires_at IS NULL OR s.expires_at > ?2) \
                 LIMIT 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![token, now_secs()], |row| {
                Ok(AuthUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    display_name: row.get(2)?,
                    role: row.get(3)?,
                })
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM user_sessions WHERE token = ?1", params![token])
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(())
        })
    }

    pub fn find_user_id(&self, username: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.prepare_cached("SELECT id FROM users WHERE username = ?1 LIMIT 1")
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![username], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))
        })
    }

    // ---------------------------------------------------------------
    // Password reset
    // ---------------------------------------------------------------

    pub fn create_reset_token(&self, user_id: i64, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "INSERT INTO password_reset_tokens (user_id, token, expires_at) \
                 VALUES (?1, ?2, ?3)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![user_id, token, now_secs() + RESET_TTL_SECS])
            .map_err(|e| Error::Database(e.to_string()))?;
            Ok(())
        })
    }

    /// Apply a password reset. Returns false when the token is unknown or
    /// expired. The token is single-use.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let user_id: Option<i64> = conn
                .prepare_cached(
                    "SELECT user_id FROM password_reset_tokens \
                     WHERE token = ?1 AND expires_at > ?2 LIMIT 1",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![token, now_secs()], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;

            let Some(user_id) = user_id else {
                return Ok(false);
            };
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                params![hash_password(new_password), user_id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
            conn.execute(
                "DELETE FROM password_reset_tokens WHERE token = ?1",
                params![token],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
            Ok(true)
        })
    }

    // ---------------------------------------------------------------
    // Favorites
    // ---------------------------------------------------------------

    /// Flip the favorite state for `(user, pub_no)`. Returns the new state.
    pub fn toggle_favorite(&self, user_id: i64, pub_no: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .prepare_cached(
                    "SELECT id FROM user_favorites WHERE user_id = ?1 AND pub_no = ?2 LIMIT 1",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![user_id, pub_no], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;

            match existing {
                Some(id) => {
                    conn.execute("DELETE FROM user_favorites WHERE id = ?1", params![id])
                        .map_err(|e| Error::Database(e.to_string()))?;
                    Ok(false)
                }
                None => {
                    conn.execute(
                        "INSERT INTO user_favorites (user_id, pub_no, created_at) VALUES (?1, ?2, ?3)",
                        params![user_id, pub_no, now_secs()],
                    )
                    .map_err(|e| Error::Database(e.to_string()))?;
                    Ok(true)
                }
            }
        })
    }

    /// Paginated favorites joined with patent summary columns.
    pub fn list_favorites(
        &self,
        user_id: i64,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<FavoriteItem>, i64)> {
        self.with_conn(|conn| {
            let total: i64 = conn
                .prepare_cached("SELECT COUNT(1) FROM user_favorites WHERE user_id = ?1")
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![user_id], |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))?;

            let offset = page.saturating_sub(1) * page_size;
            let mut stmt = conn
                .prepare_cached(
                    "SELECT f.pub_no, p.title, p.ipc_main, p.pub_date \
                     FROM user_favorites f LEFT JOIN patents p ON f.pub_no = p.pub_no \
                     WHERE f.user_id = ?1 ORDER BY f.id DESC LIMIT ?2 OFFSET ?3",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            let rows = stmt
                .query_map(params![user_id, page_size as i64, offset as i64], |row| {
                    Ok(FavoriteItem {
                        pub_no: row.get(0)?,
                        title: row.get(1)?,
                        ipc_main: row.get(2)?,
                        pub_date: row.get(3)?,
                    })
                })
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok((rows.filter_map(|r| r.ok()).collect(), total))
        })
    }

    // ---------------------------------------------------------------
    // Notes
    // ---------------------------------------------------------------

    pub fn create_note(&self, user_id: i64, pub_no: &str, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "INSERT INTO user_notes (user_id, pub_no, content, updated_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![user_id, pub_no, content, now_secs()])
            .map_err(|e| Error::Database(e.to_string()))
        })
    }

    pub fn list_notes(
        &self,
        user_id: i64,
        pub_no: &str,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<NoteItem>, i64)> {
        self.with_conn(|conn| {
            let total: i64 = conn
                .prepare_cached(
                    "SELECT COUNT(1) FROM user_notes WHERE user_id = ?1 AND pub_no = ?2",
                )
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![user_id, pub_no], |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))?;

            let offset = page.saturating_sub(1) * page_size;
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, content, updated_at FROM user_notes \
                     WHERE user_id = ?1 AND pub_no = ?2 ORDER BY id DESC LIMIT ?3 OFFSET ?4",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            let rows = stmt
                .query_map(
                    params![user_id, pub_no, page_size as i64, offset as i64],
                    |row| {
                        Ok(NoteItem {
                            id: row.get(0)?,
                            content: row.get(1)?,
                            updated_at: row.get(2)?,
                        })
                    },
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok((rows.filter_map(|r| r.ok()).collect(), total))
        })
    }

    /// Update a note's content. Owner-scoped; returns whether a row changed.
    pub fn update_note(&self, user_id: i64, note_id: i64, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count = conn
                .execute(
                    "UPDATE user_notes SET content = ?1, updated_at = ?2 \
                     WHERE id = ?3 AND user_id = ?4",
                    params![content, now_secs(), note_id, user_id],
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(count > 0)
        })
    }

    pub fn delete_note(&self, user_id: i64, note_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let count = conn
                .execute(
                    "DELETE FROM user_notes WHERE id = ?1 AND user_id = ?2",
                    params![note_id, user_id],
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(count > 0)
        })
    }

    // ---------------------------------------------------------------
    // Export tasks
    // ---------------------------------------------------------------

    pub fn create_export_task(&self, user_id: i64, params_json: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "INSERT INTO export_tasks (user_id, params_json, status, created_at) \
                 VALUES (?1, ?2, 'pending', ?3)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![user_id, params_json, now_secs()])
            .map_err(|e| Error::Database(e.to_string()))
        })
    }

    pub fn mark_export_task(
        &self,
        task_id: i64,
        status: &str,
        file_path: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE export_tasks SET status = ?1, file_path = COALESCE(?2, file_path) \
                 WHERE id = ?3",
                params![status, file_path, task_id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
            Ok(())
        })
    }

    /// Fetch a task, owner-scoped.
    pub fn get_export_task(&self, task_id: i64, user_id: i64) -> Result<Option<ExportTask>> {
        self.with_conn(|conn| {
            conn.prepare_cached(
                "SELECT id, status, file_path FROM export_tasks \
                 WHERE id = ?1 AND user_id = ?2 LIMIT 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![task_id, user_id], |row| {
                Ok(ExportTask {
                    id: row.get(0)?,
                    status: row.get(1)?,
                    file_path: row.get(2)?,
                })
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
        })
    }

    // ---------------------------------------------------------------
    // Admin
    // ---------------------------------------------------------------

    /// Admin listing with optional keyword (username/email) and role
    /// filters.
    pub fn list_users(
        &self,
        kw: Option<&str>,
        role: Option<&str>,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<UserRow>, i64)> {
        self.with_conn(|conn| {
            let kw = kw.filter(|s| !s.is_empty());
            let role = role.filter(|s| !s.is_empty());
            let mut clauses: Vec<&str> = Vec::new();
            let mut args: Vec<(&str, &dyn ToSql)> = Vec::new();
            if let Some(kw) = &kw {
                clauses.push("(username LIKE '%' || :kw || '%' OR email LIKE '%' || :kw || '%')");
                args.push((":kw", kw));
            }
            if let Some(role) = &role {
                clauses.push("role = :role");
                args.push((":role", role));
            }
            let where_sql = if clauses.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", clauses.join(" AND "))
            };

            let count_sql = format!("SELECT COUNT(1) FROM users {}", where_sql);
            let total: i64 = conn
                .prepare(&count_sql)
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(&args[..], |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))?;

            let limit = page_size as i64;
            let offset = (page.saturating_sub(1) * page_size) as i64;
            let list_sql = format!(
                "SELECT id, username, display_name, email, role, status, created_at \
                 FROM users {} ORDER BY id DESC LIMIT :limit OFFSET :offset",
                where_sql
            );
            args.push((":limit", &limit));
            args.push((":offset", &offset));
            let mut stmt = conn
                .prepare(&list_sql)
                .map_err(|e| Error::Database(e.to_string()))?;
            let rows = stmt
                .query_map(&args[..], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                        email: row.get(3)?,
                        role: row.get(4)?,
                        status: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok((rows.filter_map(|r| r.ok()).collect(), total))
        })
    }

    /// Partial update of an account. Absent fields are left untouched.
    pub fn update_user(&self, user_id: i64, patch: &UserPatch) -> Result<bool> {
        self.with_conn(|conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut args: Vec<(&str, &dyn ToSql)> = Vec::new();
            if let Some(display_name) = &patch.display_name {
                sets.push("display_name = :display_name");
                args.push((":display_name", display_name as &dyn ToSql));
            }
            if let Some(email) = &patch.email {
                sets.push("email = :email");
                args.push((":email", email as &dyn ToSql));
            }
            if let Some(role) = &patch.role {
                sets.push("role = :role");
                args.push((":role", role as &dyn ToSql));
            }
            if let Some(status) = &patch.status {
                sets.push("status = :status");
                args.push((":status", status as &dyn ToSql));
            }
            if sets.is_empty() {
                return Ok(false);
            }
            let sql = format!("UPDATE users SET {} WHERE id = :id", sets.join(", "));
            args.push((":id", &user_id));
            let count = conn
                .prepare(&sql)
                .map_err(|e| Error::Database(e.to_string()))?
                .execute(&args[..])
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(count > 0)
        })
    }

    pub fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let count = conn
                .execute("DELETE FROM users WHERE id = ?1", params![user_id])
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(count > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (tempfile::TempDir, PatentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PatentStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn password_hash_is_sha256_hex() {
        let h = hash_password("123456");
        assert_eq!(h.len(), 64);
        assert_eq!(hash_password("123456"), h);
        assert_ne!(hash_password("1234567"), h);
    }

    #[test]
    fn root_admin_is_seeded_once() {
        let (_dir, store) = open_store();
        let admin = store.verify_login("root", "123456").unwrap().unwrap();
        assert_eq!(admin.role, "admin");
        // Duplicate registration of "root" is rejected.
        let err = store.create_user("root", "x", "x", None, "user");
        assert!(matches!(err, Err(Error::Duplicate(_))));
    }

    #[test]
    fn login_session_logout_round_trip() {
        let (_dir, store) = open_store();
        let uid = store
            .create_user("alice", "secret", "Alice", None, "user")
            .unwrap();
        assert!(store.verify_login("alice", "wrong").unwrap().is_none());
        let user = store.verify_login("alice", "secret").unwrap().unwrap();
        assert_eq!(user.id, uid);

        store.create_session(uid, "tok123").unwrap();
        let me = store.session_user("tok123").unwrap().unwrap();
        assert_eq!(me.username, "alice");
        assert!(store.session_user("bogus").unwrap().is_none());

        store.delete_session("tok123").unwrap();
        assert!(store.session_user("tok123").unwrap().is_none());
    }

    #[test]
    fn password_reset_is_single_use() {
        let (_dir, store) = open_store();
        let uid = store
            .create_user("bob", "oldpw", "Bob", None, "user")
            .unwrap();
        store.create_reset_token(uid, "reset1").unwrap();
        assert!(store.reset_password("reset1", "newpw").unwrap());
        assert!(store.verify_login("bob", "newpw").unwrap().is_some());
        assert!(store.verify_login("bob", "oldpw").unwrap().is_none());
        // Token consumed.
        assert!(!store.reset_password("reset1", "again").unwrap());
        assert!(!store.reset_password("unknown", "pw").unwrap());
    }

    #[test]
    fn favorite_toggle_flips() {
        let (_dir, store) = open_store();
        let uid = store.create_user("carl", "pw", "Carl", None, "user").unwrap();
        assert!(store.toggle_favorite(uid, "CN1A").unwrap());
        assert!(!store.toggle_favorite(uid, "CN1A").unwrap());
        assert!(store.toggle_favorite(uid, "CN1A").unwrap());
        let (list, total) = store.list_favorites(uid, 1, 20).unwrap();
        assert_eq!(total, 1);
        assert_eq!(list[0].pub_no, "CN1A");
    }

    #[test]
    fn notes_are_owner_scoped() {
        let (_dir, store) = open_store();
        let alice = store.create_user("alice", "pw", "A", None, "user").unwrap();
        let bob = store.create_user("bob", "pw", "B", None, "user").unwrap();
        let note_id = store.create_note(alice, "CN1A", "interesting claim").unwrap();

        let (notes, total) = store.list_notes(alice, "CN1A", 1, 50).unwrap();
        assert_eq!(total, 1);
        assert_eq!(notes[0].content, "interesting claim");

        // Bob cannot touch Alice's note.
        assert!(!store.update_note(bob, note_id, "hijack").unwrap());
        assert!(!store.delete_note(bob, note_id).unwrap());
        assert!(store.update_note(alice, note_id, "revised").unwrap());
        assert!(store.delete_note(alice, note_id).unwrap());
    }

    #[test]
    fn export_task_lifecycle() {
        let (_dir, store) = open_store();
        let uid = store.create_user("dana", "pw", "D", None, "user").unwrap();
        let task_id = store.create_export_task(uid, "{\"tree\":null}").unwrap();
        let task = store.get_export_task(task_id, uid).unwrap().unwrap();
        assert_eq!(task.status, "pending");

        store
            .mark_export_task(task_id, "done", Some("/tmp/export_1.csv"))
            .unwrap();
        let task = store.get_export_task(task_id, uid).unwrap().unwrap();
        assert_eq!(task.status, "done");
        assert_eq!(task.file_path.as_deref(), Some("/tmp/export_1.csv"));

        // Owner scoping.
        assert!(store.get_export_task(task_id, uid + 1).unwrap().is_none());
    }

    #[test]
    fn admin_user_listing_and_patch() {
        let (_dir, store) = open_store();
        store.create_user("eve", "pw", "Eve", Some("eve@x.io"), "user").unwrap();
        store.create_user("mallory", "pw", "M", None, "admin").unwrap();

        let (rows, total) = store.list_users(None, None, 1, 20).unwrap();
        assert_eq!(total, 3); // root + 2
        assert_eq!(rows[0].username, "mallory"); // newest first

        let (rows, _) = store.list_users(Some("eve"), None, 1, 20).unwrap();
        assert_eq!(rows.len(), 1);
        let (rows, _) = store.list_users(None, Some("admin"), 1, 20).unwrap();
        assert_eq!(rows.len(), 2);

        let eve_id = rows_id(&store, "eve");
        let changed = store
            .update_user(
                eve_id,
                &UserPatch {
                    role: Some("admin".to_string()),
                    status: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);
        // Disabled accounts cannot log in.
        assert!(store.verify_login("eve", "pw").unwrap().is_none());

        assert!(store.delete_user(eve_id).unwrap());
        assert!(!store.delete_user(eve_id).unwrap());
    }

    fn rows_id(store: &PatentStore, username: &str) -> i64 {
        store.find_user_id(username).unwrap().unwrap()
    }
}
