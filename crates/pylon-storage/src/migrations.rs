//! Schema migrations
//!
//! Steps are applied in order and the number applied is kept in SQLite's
//! `user_version` header field. Step `n` moves the schema to version `n + 1`.

use rusqlite::Connection;

use crate::Result;

/// The key-value table. `expires_at` is unix milliseconds; NULL never expires.
const KV_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at INTEGER,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_kv_expires ON kv(expires_at);
"#;

const MIGRATIONS: &[(&str, &str)] = &[("key-value table", KV_TABLE)];

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let applied = schema_version(conn)?;

    for (version, (name, sql)) in MIGRATIONS.iter().enumerate().skip(applied) {
        let target = version + 1;
        tracing::info!(version = target, step = *name, "Applying storage migration");

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", target as i64)?;
        tx.commit()?;
    }

    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(usize::try_from(version).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len());
    }

    #[test]
    fn test_rerun_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO kv (key, value, expires_at, updated_at) VALUES ('k', 'v', NULL, 'now')",
            [],
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len());
    }
}
