use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::level::Level;
use crate::session::DEFAULT_DURATION;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Kept as text so a hand-edited file with an unknown level still loads
    pub level: String,
    pub duration_secs: u64,
    pub name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::default().to_string(),
            duration_secs: DEFAULT_DURATION.as_secs(),
            name: None,
        }
    }
}

impl Config {
    pub fn level(&self) -> Level {
        Level::parse_or_default(&self.level)
    }

    pub fn duration(&self) -> Duration {
        if self.duration_secs == 0 {
            log::warn!("duration of 0s configured; using {DEFAULT_DURATION:?}");
            return DEFAULT_DURATION;
        }
        Duration::from_secs(self.duration_secs)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(dirs: &AppDirs) -> Self {
        Self::with_path(dirs.config_path())
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring malformed config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
