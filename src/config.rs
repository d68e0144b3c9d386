use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::api::DEFAULT_API_URL;
use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::runtime::INPUT_DEBOUNCE;
use crate::session::SessionConfig;
use crate::text::{Difficulty, Language};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub difficulty: Difficulty,
    pub api_url: String,
    pub offline: bool,
    pub debounce_ms: u64,
    /// assigned by the result store on the first saved result
    pub user_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::default(),
            difficulty: Difficulty::default(),
            api_url: DEFAULT_API_URL.to_string(),
            offline: false,
            debounce_ms: INPUT_DEBOUNCE.as_millis() as u64,
            user_id: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.language, self.difficulty)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable config, using defaults"
                );
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps the config in memory, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: std::sync::Mutex<Option<Config>>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Config {
        self.saved
            .lock()
            .ok()
            .and_then(|c| c.clone())
            .unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(cfg.clone());
        }
        Ok(())
    }
}
