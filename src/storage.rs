// File: ./src/storage.rs
// Events kept in a local JSON file
use crate::error::Result;
use crate::model::EventRecord;
use crate::source::{EventFilter, EventSource};
use async_trait::async_trait;
use directories::ProjectDirs;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `events.json` in the user's data directory.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(proj) = ProjectDirs::from("com", "evcal", "evcal") {
            let data_dir = proj.data_dir();
            if !data_dir.exists() {
                let _ = fs::create_dir_all(data_dir);
            }
            return Some(data_dir.join("events.json"));
        }
        None
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Runs `f` while holding an exclusive lock on `<path>.lock`.
    pub fn with_lock<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;
        let result = f();
        FileExt::unlock(&lock_file)?;
        result
    }

    pub fn save(&self, events: &[EventRecord]) -> Result<()> {
        Self::with_lock(&self.path, || {
            let json = serde_json::to_string_pretty(events)?;
            Self::atomic_write(&self.path, json)
        })
    }

    /// A missing file is an empty store; a corrupt one is an error.
    pub fn load(&self) -> Result<Vec<EventRecord>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        Self::with_lock(&self.path, || {
            let file = File::open(&self.path)?;
            let events: Vec<EventRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;
            Ok(events)
        })
    }
}

#[async_trait]
impl EventSource for LocalStorage {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>> {
        let storage = self.clone();
        let events = tokio::task::spawn_blocking(move || storage.load())
            .await
            .map_err(|e| crate::error::CalendarError::Source(e.to_string()))??;
        let total = events.len();
        let matching = filter.apply(events);
        debug!(path = %self.path.display(), total, matching = matching.len(), "loaded local events");
        Ok(matching)
    }
}
