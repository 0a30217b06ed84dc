use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::version::cache::{CacheBackend, CacheEntry, CacheMap};
use crate::version::error::CacheError;

/// Cache backend keeping one row per coordinate in a SQLite database
pub struct SqliteCache {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteCache {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        debug!("Opening cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let cache = Self {
            conn: Mutex::new(conn),
            path: std::path::absolute(db_path).unwrap_or_else(|_| db_path.to_path_buf()),
        };

        cache.create_schema()?;
        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                coordinate TEXT PRIMARY KEY,
                checked_at INTEGER NOT NULL,
                version TEXT NOT NULL,
                repository TEXT NOT NULL,
                last_modified TEXT,
                recent_versions TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(())
    }
}

impl CacheBackend for SqliteCache {
    fn load(&self) -> Result<CacheMap, CacheError> {
        info!("Load Cache: {}", self.path.display());

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT coordinate, checked_at, version, repository, last_modified, recent_versions
            FROM cache_entries
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = CacheMap::with_capacity(rows.len());
        for (coordinate, timestamp, version, repository, last_modified, recent) in rows {
            entries.insert(
                coordinate,
                CacheEntry {
                    timestamp,
                    version,
                    repository,
                    last_modified,
                    recent_versions: serde_json::from_str(&recent)?,
                },
            );
        }

        debug!("Loaded {} cache entries", entries.len());
        Ok(entries)
    }

    fn save(&self, entries: &CacheMap) -> Result<(), CacheError> {
        info!("Save Cache: {}", self.path.display());

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO cache_entries
                    (coordinate, checked_at, version, repository, last_modified, recent_versions)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(coordinate) DO UPDATE SET
                    checked_at = excluded.checked_at,
                    version = excluded.version,
                    repository = excluded.repository,
                    last_modified = excluded.last_modified,
                    recent_versions = excluded.recent_versions
                "#,
            )?;
            for (coordinate, entry) in entries {
                let recent = serde_json::to_string(&entry.recent_versions)?;
                stmt.execute((
                    coordinate,
                    entry.timestamp,
                    &entry.version,
                    &entry.repository,
                    &entry.last_modified,
                    recent,
                ))?;
            }
        }
        tx.commit()?;

        debug!("Saved {} cache entries", entries.len());
        Ok(())
    }
}
