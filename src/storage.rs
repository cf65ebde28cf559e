//! Local persistence: one `SQLite` file per campaign under the storage
//! root.
//!
//! ```text
//! <root>/<uuid>.sqlite
//! ```
//!
//! Every engine operation opens its own connection; WAL plus a busy
//! timeout makes the store the only serialization point for concurrent
//! strikes. Counter updates are expressed as atomic SQL arithmetic, never
//! read-then-write of an absolute value, and single-winner transitions
//! (marking a kill) are guarded updates checked by row count.
//!
//! Entity helpers live in the submodules as free functions over
//! `&Connection`, so the same code serves plain connections and open
//! transactions.

pub mod campaign;
pub mod enemy;
pub mod log;
pub mod participant;

use std::{fs, io, path::PathBuf, time::Duration};

use rusqlite::Connection;
use uuid::Uuid;

use crate::model::{Campaign, CampaignSnapshot};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("campaign not found: {0}")]
    CampaignNotFound(Uuid),

    #[error("campaign already exists: {0}")]
    CampaignAlreadyExists(Uuid),

    #[error("corrupt campaign store: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// How many chronicle entries ride along in a snapshot, newest first.
pub const LOG_TAIL: usize = 50;

/// File-per-campaign storage rooted at a directory.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Creates the database file for a new campaign and applies the
    /// schema.
    pub fn create_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.campaign_path(id);
        if path.exists() {
            return Err(StorageError::CampaignAlreadyExists(id));
        }
        let conn = Connection::open(&path)?;
        configure(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Opens the database file for an existing campaign.
    pub fn open_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.campaign_path(id);
        if !path.exists() {
            return Err(StorageError::CampaignNotFound(id));
        }
        let conn = Connection::open(&path)?;
        configure(&conn)?;
        Ok(conn)
    }

    /// Deletes the database file for an abandoned campaign.
    pub fn delete_db(&self, id: Uuid) -> Result<()> {
        let path = self.campaign_path(id);
        if !path.exists() {
            return Err(StorageError::CampaignNotFound(id));
        }
        fs::remove_file(&path)?;
        // WAL sidecars linger only between checkpoints.
        for ext in ["sqlite-wal", "sqlite-shm"] {
            let sidecar = path.with_extension(ext);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
        Ok(())
    }

    /// Lists all campaigns by reading each `.sqlite` file in the root.
    ///
    /// Unreadable or malformed files are silently skipped.
    pub fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(campaigns),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sqlite") {
                continue;
            }
            let Ok(conn) = Connection::open(&path) else {
                continue;
            };
            if let Ok(c) = campaign::load(&conn) {
                campaigns.push(c);
            }
        }
        campaigns.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(campaigns)
    }

    fn campaign_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.sqlite"))
    }
}

/// Loads the full client-facing snapshot from an open connection.
pub fn load_snapshot(conn: &Connection) -> Result<CampaignSnapshot> {
    Ok(CampaignSnapshot {
        campaign: campaign::load(conn)?,
        participants: participant::load_all(conn)?,
        enemies: enemy::load_all(conn)?,
        log: log::tail(conn, LOG_TAIL)?,
    })
}

/// Per-connection pragmas: WAL so readers never block the writer, and a
/// busy timeout so writer contention waits instead of failing.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}

const SCHEMA: &str = "
CREATE TABLE campaign (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    config        TEXT NOT NULL,
    current_cycle INTEGER NOT NULL,
    cursor        INTEGER NOT NULL,
    completed     INTEGER NOT NULL DEFAULT 0,
    endless       INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE participant (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    level             INTEGER NOT NULL,
    weapon_tier       INTEGER NOT NULL,
    total_oaths       INTEGER NOT NULL,
    cycle_oaths       INTEGER NOT NULL,
    status            TEXT NOT NULL,
    bounty_score      INTEGER NOT NULL,
    max_roll_count    INTEGER NOT NULL,
    highest_roll      INTEGER NOT NULL,
    bounty_updated_at TEXT NOT NULL,
    enlisted_at       TEXT NOT NULL
);

CREATE TABLE enemy (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL,
    vitality     INTEGER NOT NULL,
    max_vitality INTEGER NOT NULL,
    loot_tier    INTEGER NOT NULL,
    ordering     INTEGER NOT NULL,
    defeated     INTEGER NOT NULL DEFAULT 0,
    loot_winner  TEXT,
    kind         TEXT NOT NULL,
    debtor       TEXT
);

CREATE INDEX idx_enemy_ordering ON enemy (ordering);

CREATE TABLE chronicle (
    seq   INTEGER PRIMARY KEY AUTOINCREMENT,
    at    TEXT NOT NULL,
    kind  TEXT NOT NULL,
    event TEXT NOT NULL
);

CREATE INDEX idx_chronicle_kind ON chronicle (kind, seq);
";

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::model::{Enemy, EnemyKind, QuestConfig};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("campaigns")).unwrap();
        (dir, storage)
    }

    fn sample_campaign(id: Uuid) -> Campaign {
        Campaign {
            id,
            name: "The Gjallar Forge".into(),
            config: QuestConfig {
                cycles: 4,
                oaths_per_cycle: 3,
                roster_size: 2,
            },
            current_cycle: 1,
            cursor: 0,
            completed: false,
            endless: false,
            created_at: Timestamp::now(),
        }
    }

    fn sample_enemy(ordering: i64) -> Enemy {
        Enemy {
            id: Uuid::new_v4(),
            name: "Goblin Scout".into(),
            description: "A nimble nuisance.".into(),
            vitality: 1_000,
            max_vitality: 1_000,
            loot_tier: 1,
            ordering,
            defeated: false,
            loot_winner: None,
            kind: EnemyKind::Regular,
            debtor: None,
        }
    }

    #[test]
    fn create_then_open_db() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();

        let conn = storage.create_db(id).unwrap();
        campaign::insert(&conn, &sample_campaign(id)).unwrap();
        drop(conn);

        let conn = storage.open_db(id).unwrap();
        let loaded = campaign::load(&conn).unwrap();
        assert_eq!(loaded.id, id);
    }

    #[test]
    fn create_duplicate_db_fails() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();

        storage.create_db(id).unwrap();
        let err = storage.create_db(id).unwrap_err();

        assert!(matches!(err, StorageError::CampaignAlreadyExists(_)));
    }

    #[test]
    fn open_nonexistent_db_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.open_db(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::CampaignNotFound(_)));
    }

    #[test]
    fn delete_db_removes_the_campaign() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();

        storage.create_db(id).unwrap();
        storage.delete_db(id).unwrap();

        let err = storage.open_db(id).unwrap_err();
        assert!(matches!(err, StorageError::CampaignNotFound(_)));
    }

    #[test]
    fn delete_nonexistent_db_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.delete_db(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::CampaignNotFound(_)));
    }

    #[test]
    fn list_campaigns_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.list_campaigns().unwrap().is_empty());
    }

    #[test]
    fn list_campaigns_returns_all_sorted_by_created_at() {
        let (_dir, storage) = test_storage();

        let mut c1 = sample_campaign(Uuid::new_v4());
        c1.name = "First".into();
        c1.created_at = Timestamp::new(1_000_000_000, 0).unwrap();

        let mut c2 = sample_campaign(Uuid::new_v4());
        c2.name = "Second".into();
        c2.created_at = Timestamp::new(2_000_000_000, 0).unwrap();

        // Create in reverse order to verify sorting.
        let conn = storage.create_db(c2.id).unwrap();
        campaign::insert(&conn, &c2).unwrap();
        drop(conn);
        let conn = storage.create_db(c1.id).unwrap();
        campaign::insert(&conn, &c1).unwrap();
        drop(conn);

        let campaigns = storage.list_campaigns().unwrap();
        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[0].name, "First");
        assert_eq!(campaigns[1].name, "Second");
    }

    #[test]
    fn concurrent_decrements_all_land() {
        let (_dir, storage) = test_storage();
        let id = Uuid::new_v4();
        let foe = sample_enemy(0);
        let foe_id = foe.id;

        let conn = storage.create_db(id).unwrap();
        campaign::insert(&conn, &sample_campaign(id)).unwrap();
        enemy::insert(&conn, &foe).unwrap();
        drop(conn);

        let storage = Arc::new(storage);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let storage = Arc::clone(&storage);
            handles.push(thread::spawn(move || {
                let conn = storage.open_db(id).unwrap();
                for _ in 0..10 {
                    enemy::apply_damage(&conn, foe_id, 3).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = storage.open_db(id).unwrap();
        assert_eq!(enemy::vitality(&conn, foe_id).unwrap(), 1_000 - 4 * 10 * 3);
    }
}
