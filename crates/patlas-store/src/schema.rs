//! Database schema SQL.

/// Patent corpus and account tables.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS patents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pub_no TEXT NOT NULL UNIQUE,
    app_no TEXT,
    title TEXT NOT NULL DEFAULT '',
    abstract TEXT,
    app_date TEXT,
    pub_date TEXT,
    inventors TEXT,
    inventor_count INTEGER,
    applicants_current TEXT,
    applicants_current_count INTEGER,
    ipc TEXT,
    ipc_main TEXT,
    ipc_main_prefix TEXT,
    non_patent_citations INTEGER,
    legal_status TEXT,
    cited_by TEXT,
    cites TEXT,
    apply_year INTEGER,
    patsnap_family_count INTEGER,
    office TEXT,
    patent_type TEXT,
    grant_flag INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_patents_pub_date ON patents(pub_date);
CREATE INDEX IF NOT EXISTS idx_patents_apply_year ON patents(apply_year);
CREATE INDEX IF NOT EXISTS idx_patents_ipc_prefix ON patents(ipc_main_prefix);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT,
    email TEXT,
    avatar_url TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    status INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON user_sessions(user_id);

CREATE TABLE IF NOT EXISTS password_reset_tokens (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reset_user ON password_reset_tokens(user_id);

CREATE TABLE IF NOT EXISTS user_favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    pub_no TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fav_user ON user_favorites(user_id);

CREATE TABLE IF NOT EXISTS user_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    pub_no TEXT NOT NULL,
    content TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_user_pub ON user_notes(user_id, pub_no);

CREATE TABLE IF NOT EXISTS export_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    params_json TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    file_path TEXT,
    created_at INTEGER NOT NULL
);
"#;

/// FTS5 virtual table for keyword relevance search over title/abstract.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS patents_fts USING fts5(
    title, abstract,
    content='patents', content_rowid='id',
    tokenize='porter unicode61'
);
"#;

/// Triggers to keep the FTS index in sync with the patents table.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS patents_ai AFTER INSERT ON patents BEGIN
    INSERT INTO patents_fts(rowid, title, abstract)
    VALUES (new.id, new.title, COALESCE(new.abstract, ''));
END;

CREATE TRIGGER IF NOT EXISTS patents_ad AFTER DELETE ON patents BEGIN
    INSERT INTO patents_fts(patents_fts, rowid, title, abstract)
    VALUES ('delete', old.id, old.title, COALESCE(old.abstract, ''));
END;

CREATE TRIGGER IF NOT EXISTS patents_au AFTER UPDATE ON patents BEGIN
    INSERT INTO patents_fts(patents_fts, rowid, title, abstract)
    VALUES ('delete', old.id, old.title, COALESCE(old.abstract, ''));
    INSERT INTO patents_fts(rowid, title, abstract)
    VALUES (new.id, new.title, COALESCE(new.abstract, ''));
END;
"#;
