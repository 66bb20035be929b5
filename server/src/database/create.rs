use tokio_rusqlite::{Connection, Result};
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `create_tables`.
const SCHEMA_VERSION: u32 = 1;

/// Initialize the database schema.
///
/// Everything the service persists lives in one `profile` table: identity,
/// contact, credential hash, and counters.  Splitting those concerns into
/// separate tables buys nothing at this size.
pub async fn create_tables(conn: &Connection) -> Result<()> {
    conn.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS profile (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT    NOT NULL,
                phone         TEXT    NOT NULL UNIQUE,
                password_hash TEXT    NOT NULL,
                login_count   INTEGER NOT NULL DEFAULT 0,
                created_at    INTEGER NOT NULL,
                updated_at    INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_profile_phone ON profile(phone)",
            [],
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        // Migration arms go here when SCHEMA_VERSION moves past 1, keyed on
        // the previous `PRAGMA user_version` value.

        Ok(())
    })
    .await
}

/// Open or create the database and ensure the schema is up to date.
pub async fn open_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).await?;
    create_tables(&conn).await?;
    info!("Database ready at {}", path);
    Ok(conn)
}
