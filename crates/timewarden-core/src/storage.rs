//! The storage protocol.
//!
//! One durable document, three top-level keys (`configs`, `usageLog`,
//! `settings`), each stored as a JSON string under an atomic key-value
//! capability. Loads validate each key independently: a corrupt value is
//! replaced by its default (and logged) without touching its neighbours.
//! Writes are full-object replacements of the touched key.
//!
//! Read-modify-write correctness is the engine's responsibility (its serial
//! queue), not storage's.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::{GlobalSettings, HostnameConfig};
use crate::error::StorageError;
use crate::usage::UsageLog;

/// Top-level keys of the durable document. The names are part of the
/// contract with existing installations.
pub mod keys {
    pub const CONFIGS: &str = "configs";
    pub const USAGE_LOG: &str = "usageLog";
    pub const SETTINGS: &str = "settings";
}

/// Atomic per-key get/set the host provides.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Typed protocol over a [`KvStore`].
#[derive(Clone)]
pub struct Storage {
    kv: Arc<dyn KvStore>,
}

impl Storage {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Load a key, falling back to the type's default when the key is
    /// missing, unreadable or corrupt. Field-level gaps inside an
    /// otherwise well-formed value are absorbed by serde defaults.
    fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(key, %err, "storage read failed, using defaults");
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "corrupt stored value, using defaults");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|err| StorageError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.kv.set(key, &raw)
    }

    pub fn load_configs(&self) -> Vec<HostnameConfig> {
        self.load_or_default(keys::CONFIGS)
    }

    pub fn save_configs(&self, configs: &[HostnameConfig]) -> Result<(), StorageError> {
        self.save(keys::CONFIGS, &configs)
    }

    pub fn load_usage_log(&self) -> UsageLog {
        self.load_or_default(keys::USAGE_LOG)
    }

    pub fn save_usage_log(&self, log: &UsageLog) -> Result<(), StorageError> {
        self.save(keys::USAGE_LOG, log)
    }

    pub fn load_settings(&self) -> GlobalSettings {
        self.load_or_default(keys::SETTINGS)
    }

    pub fn save_settings(&self, settings: &GlobalSettings) -> Result<(), StorageError> {
        self.save(keys::SETTINGS, settings)
    }

    /// Read-modify-write the usage log in one protocol step. The closure
    /// runs on the freshly loaded log; the mutated log is written back
    /// whole.
    pub fn with_usage_log<R>(
        &self,
        mutate: impl FnOnce(&mut UsageLog) -> R,
    ) -> Result<R, StorageError> {
        let mut log = self.load_usage_log();
        let result = mutate(&mut log);
        self.save_usage_log(&log)?;
        Ok(result)
    }
}

/// SQLite-backed key-value store: a single `kv(key, value)` table.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    /// Open (and migrate) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let kv = Self {
            conn: Mutex::new(conn),
        };
        kv.migrate()?;
        Ok(kv)
    }

    /// Open the store at `~/.timewarden/timewarden.db`, creating the
    /// directory if needed.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(&data_dir().join("timewarden.db"))
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let kv = Self {
            conn: Mutex::new(conn),
        };
        kv.migrate()?;
        Ok(kv)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.lock().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("kv store mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory key-value store for tests and the simulation harness.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Overwrite a key with raw (possibly invalid) text, for corruption
    /// tests.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.timewarden/`, creating it if it doesn't exist.
pub fn data_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".timewarden");
    std::fs::create_dir_all(&dir).ok();
    dir
}
