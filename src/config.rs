use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gemini::{DEFAULT_MODEL, GEMINI_API_KEY_ENV};
use crate::persist::DEFAULT_SAVE_DELAY;
use crate::review::DEFAULT_REVIEW_TIMEOUT;

pub const USER_ID: &str = "user_id";
pub const DB_PATH: &str = "db_path";
pub const GEMINI_MODEL: &str = "gemini_model";
pub const GEMINI_API_KEY: &str = "gemini_api_key";
pub const REVIEW_TIMEOUT_SECS: &str = "review_timeout_secs";
pub const SAVE_DEBOUNCE_MS: &str = "save_debounce_ms";

const DEFAULT_DB_PATH: &str = "./repcycle.db";

/// Flat key/value settings persisted as TOML.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub map: BTreeMap<String, String>,
}

pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("repcycle").join("config.toml"))
        .context("Could not determine config directory")
}

impl Config {
    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let content = toml::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to save config to {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Stable per-install identity, generated and saved on first use.
    pub fn ensure_user_id(&mut self, path: &Path) -> Result<String> {
        if let Some(id) = self.get(USER_ID) {
            return Ok(id.to_owned());
        }
        let id = Uuid::new_v4().to_string();
        self.map.insert(USER_ID.to_owned(), id.clone());
        self.save(path)?;
        Ok(id)
    }

    pub fn db_path(&self) -> &str {
        self.get(DB_PATH).unwrap_or(DEFAULT_DB_PATH)
    }

    pub fn gemini_model(&self) -> &str {
        self.get(GEMINI_MODEL).unwrap_or(DEFAULT_MODEL)
    }

    /// The environment variable wins over the stored key.
    pub fn gemini_api_key(&self) -> Option<String> {
        api_key_from(std::env::var(GEMINI_API_KEY_ENV).ok(), self.get(GEMINI_API_KEY))
    }

    pub fn review_timeout(&self) -> Duration {
        self.parsed(REVIEW_TIMEOUT_SECS)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REVIEW_TIMEOUT)
    }

    pub fn save_delay(&self) -> Duration {
        self.parsed(SAVE_DEBOUNCE_MS)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SAVE_DELAY)
    }
}

fn api_key_from(env: Option<String>, stored: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| stored.map(str::to_owned))
}
