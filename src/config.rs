// File: ./src/config.rs
use crate::client::CalDavSource;
use crate::source::EventSource;
use crate::storage::LocalStorage;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// CalDAV server, used when no `events_file` is set.
    pub url: String,
    pub username: String,
    pub password: String,
    pub allow_insecure_certs: bool,
    /// Collection hrefs to read. Empty means discover.
    pub calendars: Vec<String>,
    /// Local JSON event store. Takes precedence over CalDAV.
    pub events_file: Option<PathBuf>,
    /// Offset of the site's zone from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Asset handles the host should enqueue next to the markup.
    pub stylesheet: Option<String>,
    pub script: Option<String>,
}

impl Config {
    /// `EVCAL_CONFIG` if set, else `config.toml` in the user config dir.
    pub fn get_path() -> Option<PathBuf> {
        if let Ok(path) = env::var("EVCAL_CONFIG") {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("com", "evcal", "evcal").map(|proj| proj.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::get_path().context("no config directory")?;
        Self::load_from(&path)
    }

    /// Defaults when there is no config file; a file that exists must parse.
    pub fn load_or_default() -> Result<Self> {
        match Self::get_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("loading {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("parsing config")?;
        config.zone()?;
        Ok(config)
    }

    pub fn zone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
    }

    /// The event source this config describes.
    pub fn event_source(&self) -> Result<Box<dyn EventSource>> {
        if let Some(path) = &self.events_file {
            return Ok(Box::new(LocalStorage::new(path.clone())));
        }
        if !self.url.is_empty() {
            let source = CalDavSource::new(
                &self.url,
                &self.username,
                &self.password,
                self.allow_insecure_certs,
                self.calendars.clone(),
                self.zone()?,
            )?;
            return Ok(Box::new(source));
        }
        let path = LocalStorage::default_path().context("no data directory")?;
        Ok(Box::new(LocalStorage::new(path)))
    }
}
