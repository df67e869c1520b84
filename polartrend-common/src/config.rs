//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Subreddits scanned by default when the config file does not override them
pub const DEFAULT_SUBREDDITS: &[&str] = &[
    "SideProject",
    "startups",
    "Entrepreneur",
    "SaaS",
    "MachineLearning",
    "LocalLLaMA",
    "OpenAI",
];

/// Keywords matched against post titles, in attribution priority order
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "local", "llm", "offline", "on device", "agent", "rag", "open source",
    "edge ai", "privacy", "self host", "inference",
];

/// TOML configuration file contents
///
/// All fields are optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root data folder (database location)
    pub root_folder: Option<String>,
    /// HTTP bind address, e.g. "127.0.0.1:5730"
    pub bind_address: Option<String>,
    /// Subreddits scanned by the ingestion poller
    pub subreddits: Option<Vec<String>>,
    /// Keywords matched against post titles
    pub keywords: Option<Vec<String>>,
}

impl TomlConfig {
    /// Load the config file if one exists, otherwise return defaults
    pub fn load() -> Self {
        match config_file_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Load and parse a specific TOML config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Effective subreddit list
    pub fn subreddits(&self) -> Vec<String> {
        self.subreddits
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect())
    }

    /// Effective keyword list, in attribution priority order
    pub fn keywords(&self) -> Vec<String> {
        self.keywords
            .clone()
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect())
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable `POLARTREND_ROOT`
/// 3. TOML config file `root_folder` key
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("POLARTREND_ROOT") {
        return PathBuf::from(path);
    }

    if let Some(root_folder) = &toml_config.root_folder {
        return PathBuf::from(root_folder);
    }

    default_root_folder()
}

/// Database file path under the resolved root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("polartrend.db")
}

/// Get default configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("polartrend").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/polartrend/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("polartrend"))
        .unwrap_or_else(|| PathBuf::from("./polartrend_data"))
}
