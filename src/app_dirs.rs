use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keytempo";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("keytempo_config.json"))
    }

    /// Where logs and the offline result log live
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|pd| pd.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn log_dir() -> PathBuf {
        Self::state_dir()
    }

    pub fn results_path() -> PathBuf {
        Self::state_dir().join("results.csv")
    }
}
