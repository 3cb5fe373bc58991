use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing::level_filters::LevelFilter;

use crate::matcher::{DEFAULT_INSTAGRAM_PATTERN, DEFAULT_TIKTOK_PATTERN};

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "General")]
    pub general: GeneralConfig,
    #[serde(rename = "Paths")]
    pub paths: PathsConfig,
    #[serde(rename = "Settings")]
    pub settings: SettingsConfig,
    #[serde(rename = "Regex")]
    pub regex: RegexConfig,
}

#[derive(Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Program used to fetch media; looked up on `PATH` unless absolute.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SettingsConfig {
    /// Remove the downloaded file once it has been sent.
    #[serde(default = "default_delete_old_files")]
    pub delete_old_files: bool,
    /// Seconds between two reads of the configuration file.
    #[serde(default = "default_reload_interval_secs")]
    pub reload_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RegexConfig {
    #[serde(default = "default_tiktok_regex")]
    pub tiktok_regex: String,
    #[serde(default = "default_instagram_regex")]
    pub instagram_regex: String,
}

/// Where the values of a freshly loaded [`Config`] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    File,
    Missing,
    Malformed(String),
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_delete_old_files() -> bool {
    true
}

fn default_reload_interval_secs() -> u64 {
    60
}

fn default_tiktok_regex() -> String {
    DEFAULT_TIKTOK_PATTERN.to_string()
}

fn default_instagram_regex() -> String {
    DEFAULT_INSTAGRAM_PATTERN.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            log_level: default_log_level(),
        }
    }
}

// The token is a credential; keep it out of debug output and logs.
impl std::fmt::Debug for GeneralConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralConfig")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            logs_dir: default_logs_dir(),
            ytdlp_path: default_ytdlp_path(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            delete_old_files: default_delete_old_files(),
            reload_interval_secs: default_reload_interval_secs(),
        }
    }
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self {
            tiktok_regex: default_tiktok_regex(),
            instagram_regex: default_instagram_regex(),
        }
    }
}

impl GeneralConfig {
    /// Map the configured severity name onto a tracing level.
    /// Unrecognised names fall back to INFO.
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "NOTSET" => LevelFilter::TRACE,
            "DEBUG" => LevelFilter::DEBUG,
            "WARN" | "WARNING" => LevelFilter::WARN,
            "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::ERROR,
            "OFF" => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }
}

impl Config {
    /// Read the configuration file at `path`.
    ///
    /// Never fails: an absent file or one that does not parse yields the
    /// built-in defaults, and the returned [`LoadSource`] says which case
    /// applied. Keys missing from an otherwise valid file take their own
    /// default.
    pub fn load(path: &Path) -> (Self, LoadSource) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return (Self::default(), LoadSource::Missing),
        };

        match toml::from_str(&content) {
            Ok(config) => (config, LoadSource::File),
            Err(e) => (Self::default(), LoadSource::Malformed(e.to_string())),
        }
    }

    /// Create the downloads and logs directories if they do not exist yet.
    pub fn ensure_directories(&self) {
        for dir in [&self.paths.downloads_dir, &self.paths.logs_dir] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                error!("Failed to create directory {}: {}", dir.display(), e);
            }
        }
    }

    pub fn reload_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.settings.reload_interval_secs.max(1))
    }
}
