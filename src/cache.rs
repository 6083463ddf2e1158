//! On-device agenda cache.
//!
//! Keeps the last successfully fetched agenda snapshot per owner so a
//! failed refresh can render "stale as of <time>" instead of a blank
//! screen. Disposable derived data: safe to evict at any time, always
//! rebuilt from the store on the next good fetch.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::AgendaSnapshot;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt cached payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS agenda_cache (
        owner_id  TEXT PRIMARY KEY,
        payload   TEXT NOT NULL,
        cached_at TEXT NOT NULL
    );
";

/// A snapshot read back from the cache, with its staleness marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAgenda {
    pub snapshot: AgendaSnapshot,
    pub cached_at: DateTime<Utc>,
}

/// Key-value store of last-good agenda snapshots, one row per owner.
pub struct AgendaCache {
    conn: Connection,
}

impl AgendaCache {
    /// Open (and initialize) the cache at the given path.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// In-memory cache (for testing).
    pub fn open_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            "PRAGMA journal_mode=DELETE;
             PRAGMA foreign_keys=ON;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Store the latest good snapshot for an owner, replacing any prior one.
    pub fn put(&self, owner_id: Uuid, snapshot: &AgendaSnapshot) -> Result<(), CacheError> {
        let payload = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO agenda_cache (owner_id, payload, cached_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(owner_id) DO UPDATE SET
                payload = excluded.payload,
                cached_at = excluded.cached_at",
            params![owner_id.to_string(), payload, Utc::now()],
        )?;
        Ok(())
    }

    /// Last good snapshot for an owner, if any.
    pub fn get(&self, owner_id: Uuid) -> Result<Option<CachedAgenda>, CacheError> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, cached_at FROM agenda_cache WHERE owner_id = ?1",
                params![owner_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, DateTime<Utc>>(1)?,
                    ))
                },
            );

        match row {
            Ok((payload, cached_at)) => {
                let snapshot: AgendaSnapshot = serde_json::from_str(&payload)?;
                Ok(Some(CachedAgenda {
                    snapshot,
                    cached_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CacheError::from(e)),
        }
    }

    /// Drop the cached snapshot for an owner.
    pub fn evict(&self, owner_id: Uuid) -> Result<(), CacheError> {
        self.conn.execute(
            "DELETE FROM agenda_cache WHERE owner_id = ?1",
            params![owner_id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DateWindow;
    use chrono::NaiveDate;

    fn snapshot(generation: u64) -> AgendaSnapshot {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        AgendaSnapshot {
            days: Vec::new(),
            window: DateWindow::upcoming(today, 7),
            fetched_at: Utc::now(),
            generation,
        }
    }

    #[test]
    fn missing_owner_yields_none() {
        let cache = AgendaCache::open_memory().unwrap();
        assert!(cache.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = AgendaCache::open_memory().unwrap();
        let owner = Uuid::new_v4();
        let snap = snapshot(3);
        cache.put(owner, &snap).unwrap();

        let cached = cache.get(owner).unwrap().unwrap();
        assert_eq!(cached.snapshot, snap);
    }

    #[test]
    fn put_replaces_previous_snapshot() {
        let cache = AgendaCache::open_memory().unwrap();
        let owner = Uuid::new_v4();
        cache.put(owner, &snapshot(1)).unwrap();
        cache.put(owner, &snapshot(2)).unwrap();

        let cached = cache.get(owner).unwrap().unwrap();
        assert_eq!(cached.snapshot.generation, 2);
    }

    #[test]
    fn owners_do_not_collide() {
        let cache = AgendaCache::open_memory().unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.put(a, &snapshot(1)).unwrap();
        cache.put(b, &snapshot(2)).unwrap();

        assert_eq!(cache.get(a).unwrap().unwrap().snapshot.generation, 1);
        assert_eq!(cache.get(b).unwrap().unwrap().snapshot.generation, 2);
    }

    #[test]
    fn evict_removes_snapshot() {
        let cache = AgendaCache::open_memory().unwrap();
        let owner = Uuid::new_v4();
        cache.put(owner, &snapshot(1)).unwrap();
        cache.evict(owner).unwrap();
        assert!(cache.get(owner).unwrap().is_none());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda_cache.db");
        let owner = Uuid::new_v4();

        {
            let cache = AgendaCache::open(&path).unwrap();
            cache.put(owner, &snapshot(7)).unwrap();
        }

        let cache = AgendaCache::open(&path).unwrap();
        assert_eq!(cache.get(owner).unwrap().unwrap().snapshot.generation, 7);
    }
}
