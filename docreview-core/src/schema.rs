/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every open, using `IF NOT EXISTS` so it is safe
/// to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 key/value layout.
///
/// A single `kv` table mirrors the browser storage model: string keys, string
/// values, no ordering guarantees beyond the primary key.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS kv (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) STRICT;
";

/// Ordered migration steps; entry `i` upgrades the database to version `i + 1`.
const MIGRATIONS: &[&str] = &[SCHEMA_V1_SQL];

/// Latest schema version known to this build.
pub const LATEST_VERSION: i64 = MIGRATIONS.len() as i64;

/// Applies every step above the recorded version, each in its own
/// immediate transaction. A database written by a newer build is left as is.
///
/// # Errors
///
/// Fails if a step's DDL fails or the version row cannot be written.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;
    let applied = current_version(db).unwrap_or(0);

    for (version, ddl) in (1..).zip(MIGRATIONS.iter()) {
        if version <= applied {
            continue;
        }
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(ddl)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
        tracing::debug!(version, "settings schema migrated");
    }
    Ok(())
}

/// Reads the recorded schema version, `0` when none has been applied.
pub fn current_version(db: &rusqlite::Connection) -> rusqlite::Result<i64> {
    db.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
}
