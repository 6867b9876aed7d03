use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "typecert";

/// Centralized application directory resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirs {
    /// Platform directories, or the working directory when none can be found
    pub fn resolve() -> Self {
        match ProjectDirs::from("", "", APP_NAME) {
            Some(pd) => Self {
                config_dir: pd.config_dir().to_path_buf(),
                data_dir: pd.data_local_dir().to_path_buf(),
            },
            None => Self::rooted_at("."),
        }
    }

    /// Keep everything under a single directory
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            config_dir: root.clone(),
            data_dir: root,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join("profiles.json")
    }

    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join("results.csv")
    }

    pub fn certificates_dir(&self) -> PathBuf {
        self.data_dir.join("certificates")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(format!("{APP_NAME}.log"))
    }
}
