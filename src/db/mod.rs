use crate::api::youtube::{DEFAULT_API_BASE_URL, DEFAULT_MAX_RESULTS};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};
#[cfg(not(target_arch = "wasm32"))]
use rusqlite::{params, Connection, OptionalExtension};
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

const SETTINGS_KEY: &str = "rustytube.app_settings";
const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const MAX_RECENT_SEARCHES: usize = 5;

#[derive(Debug, Error)]
pub enum DbError {
    #[cfg(not(target_arch = "wasm32"))]
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("could not prepare data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("no data directory available on this platform")]
    NoDataDir,
    #[error("browser storage error: {0}")]
    Storage(String),
    #[error("invalid stored value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value persistence scoped to the browsing context (or the local profile on
/// desktop builds).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DbError>;
}

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|e| DbError::Storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| DbError::Storage(format!("{e:?}")))
    }
}

/// SQLite-backed store used by desktop builds.
#[cfg(not(target_arch = "wasm32"))]
pub struct SqliteStore {
    conn: Connection,
}

#[cfg(not(target_arch = "wasm32"))]
impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens `rustytube.db` under the platform data directory.
    pub fn open_default() -> Result<Self, DbError> {
        let dir = dirs::data_local_dir().ok_or(DbError::NoDataDir)?;
        Self::open(&dir.join("rustytube").join("rustytube.db"))
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, DbError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self { conn })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The store the running app persists into.
#[cfg(target_arch = "wasm32")]
pub fn platform_store() -> Box<dyn KeyValueStore> {
    Box::new(LocalStorageStore)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn platform_store() -> Box<dyn KeyValueStore> {
    match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %err, "falling back to in-memory storage");
            Box::new(MemoryStore::default())
        }
    }
}

/// Returns `recent` with `query` moved to the front, duplicates removed and the oldest
/// entries dropped past [`MAX_RECENT_SEARCHES`].
pub fn push_recent(recent: &[String], query: &str) -> Vec<String> {
    std::iter::once(query.to_string())
        .chain(recent.iter().filter(|s| s.as_str() != query).cloned())
        .take(MAX_RECENT_SEARCHES)
        .collect()
}

fn normalize_recent(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_RECENT_SEARCHES);
    for query in raw {
        if query.trim().is_empty() || out.contains(&query) {
            continue;
        }
        out.push(query);
        if out.len() == MAX_RECENT_SEARCHES {
            break;
        }
    }
    out
}

/// Most-recent-first list of recorded queries. Unreadable data loads as an empty list.
pub fn load_recent_searches(store: &dyn KeyValueStore) -> Vec<String> {
    let raw = match store.get(RECENT_SEARCHES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "could not read recent searches");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(list) => normalize_recent(list),
        Err(err) => {
            warn!(error = %err, "discarding corrupt recent searches");
            Vec::new()
        }
    }
}

/// Record `query` and return the updated list.
pub fn record_recent_search(
    store: &dyn KeyValueStore,
    query: &str,
) -> Result<Vec<String>, DbError> {
    let updated = push_recent(&load_recent_searches(store), query);
    store.set(RECENT_SEARCHES_KEY, &serde_json::to_string(&updated)?)?;
    Ok(updated)
}

/// App settings stored alongside the recent searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_query")]
    pub default_query: String,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_autoselect")]
    pub autoselect_first_result: bool,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_query() -> String {
    "music".to_string()
}

fn default_volume() -> u8 {
    100
}

fn default_autoselect() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            max_results: default_max_results(),
            default_query: default_query(),
            volume: default_volume(),
            autoselect_first_result: default_autoselect(),
        }
    }
}

impl AppSettings {
    /// Saved key first, then the key baked in at build time.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| {
                option_env!("YOUTUBE_API_KEY")
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
            })
    }

    /// The query a fresh session starts with.
    pub fn initial_query(&self, recent: &[String]) -> String {
        recent
            .first()
            .cloned()
            .unwrap_or_else(|| self.default_query.clone())
    }
}

pub fn load_settings(store: &dyn KeyValueStore) -> AppSettings {
    match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "discarding unreadable settings");
            AppSettings::default()
        }),
        Ok(None) => AppSettings::default(),
        Err(err) => {
            warn!(error = %err, "could not read settings");
            AppSettings::default()
        }
    }
}

pub fn save_settings(store: &dyn KeyValueStore, settings: &AppSettings) -> Result<(), DbError> {
    store.set(SETTINGS_KEY, &serde_json::to_string(settings)?)
}
