use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgsync_model::ExtractorCursor;
use tracing::debug;

use crate::error::{Result, SyncError};

pub const FILMWORKS_KEY: &str = "filmworks_synced_date";
pub const PERSONS_KEY: &str = "persons_synced_date";
pub const GENRES_KEY: &str = "genres_synced_date";

/// Durable key -> string mapping (spec.md §4.2). The orchestrator reads all
/// three cursor components together and writes all three together so a
/// crash between `set_all` calls is never observable — there is only ever
/// one `set_all` per iteration.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_all(&self, entries: HashMap<String, String>) -> Result<()>;
}

/// A [`StateStore`] persisted as a single JSON file, written atomically via
/// write-temp-then-rename (spec.md §4.2, §9): a crash mid-write leaves the
/// `.tmp` file orphaned and the original untouched, never a half-written
/// target file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(SyncError::Io(err)),
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set_all(&self, entries: HashMap<String, String>) -> Result<()> {
        let body = serde_json::to_string_pretty(&entries)?;
        let tmp_path = tmp_path_for(&self.path);

        tokio::fs::write(&tmp_path, body.as_bytes()).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!(path = %self.path.display(), "persisted cursor state");
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Reads the cursor triple from a [`StateStore`], defaulting any missing
/// component to the epoch minimum (spec.md §3, §6).
pub async fn load_cursor(store: &dyn StateStore) -> Result<ExtractorCursor> {
    let epoch = ExtractorCursor::epoch();
    let filmworks_at = parse_or(store.get(FILMWORKS_KEY).await?, epoch.filmworks_at)?;
    let persons_at = parse_or(store.get(PERSONS_KEY).await?, epoch.persons_at)?;
    let genres_at = parse_or(store.get(GENRES_KEY).await?, epoch.genres_at)?;
    Ok(ExtractorCursor {
        filmworks_at,
        persons_at,
        genres_at,
    })
}

/// Persists the full cursor triple atomically in one [`StateStore::set_all`]
/// call (spec.md §4.2, §4.6 step 3).
pub async fn store_cursor(store: &dyn StateStore, cursor: &ExtractorCursor) -> Result<()> {
    let mut entries = HashMap::with_capacity(3);
    entries.insert(FILMWORKS_KEY.to_string(), cursor.filmworks_at.to_rfc3339());
    entries.insert(PERSONS_KEY.to_string(), cursor.persons_at.to_rfc3339());
    entries.insert(GENRES_KEY.to_string(), cursor.genres_at.to_rfc3339());
    store.set_all(entries).await
}

fn parse_or(raw: Option<String>, default: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(default),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                SyncError::StateCorrupt(serde_json::Error::io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid instant '{s}': {e}"),
                )))
            }),
    }
}
