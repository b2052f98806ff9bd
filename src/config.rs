// Settings persisted as JSON in the platform config dir:
//   ~/Library/Application Support/tiktok-downloader/settings.json (macOS)
//   ~/.config/tiktok-downloader/settings.json (Linux)
// Read once at startup; an invalid download directory is fixed up and
// the cleaned copy written back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::SortSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base download directory; per-subject folders are created inside
    pub base_folder: String,
    /// Default fetch window for the sorts that need one
    pub default_window: usize,
    pub default_sort: SortSpec,
    pub default_count: usize,
    /// WebDriver endpoint driving the converter (chromedriver)
    pub webdriver_url: String,
    /// Bounded wait for the converter to produce a download link
    pub resolve_timeout_secs: u64,
    /// Metadata API base; overridable for testing
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_folder: default_download_dir().to_string_lossy().to_string(),
            default_window: 50,
            default_sort: SortSpec::Recent,
            default_count: 10,
            webdriver_url: "http://localhost:9515".to_string(),
            resolve_timeout_secs: 15,
            api_base_url: "https://www.tikwm.com".to_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default());
    base.join("tiktok-downloader")
}

fn settings_json_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("TikTok")
}

fn dir_is_writable(p: &Path) -> bool {
    if !p.exists() || !p.is_dir() {
        return false;
    }
    let probe = p.join(format!(".writecheck-{}.tmp", std::process::id()));
    match fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = fs::remove_file(probe);
            true
        }
        Err(_) => false,
    }
}

/// Validate a candidate base folder; fall back to the default Downloads
/// location when it cannot be created or written
fn validated_base_folder<S: Into<String>>(candidate: S) -> String {
    let cand = candidate.into();
    let mut path = PathBuf::from(cand.trim());

    if path.as_os_str().is_empty() || !path.is_absolute() {
        path = default_download_dir();
    }

    if !path.exists() && fs::create_dir_all(&path).is_err() {
        path = default_download_dir();
        let _ = fs::create_dir_all(&path);
    }

    if !dir_is_writable(&path) {
        let d = default_download_dir();
        let _ = fs::create_dir_all(&d);
        warn!(fallback = %d.display(), "base folder not writable, using default");
        return d.to_string_lossy().to_string();
    }

    path.to_string_lossy().to_string()
}

/// Load settings from `path`, validate the base folder, and persist any
/// fixups back to disk
pub fn load_settings_from(path: &Path) -> Settings {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let mut settings = match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str::<Settings>(&s).unwrap_or_default(),
        Err(_) => Settings::default(),
    };

    let fixed = validated_base_folder(&settings.base_folder);
    if settings.base_folder != fixed {
        settings.base_folder = fixed;
    }
    settings.default_count = settings.default_count.max(1);
    settings.default_window = settings.default_window.max(1);

    // Persist the clean copy (also migrates an old or invalid file)
    let body = serde_json::to_string_pretty(&settings).unwrap_or_else(|_| "{}".into());
    let _ = fs::write(path, body);

    settings
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_json_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults_and_writes_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = load_settings_from(&path);
        assert_eq!(settings.default_count, 10);
        assert_eq!(settings.default_sort, SortSpec::Recent);
        assert!(path.exists());
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_count": 3 }"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.default_count, 3);
        assert_eq!(settings.webdriver_url, "http://localhost:9515");
    }

    #[test]
    fn zero_counts_are_bumped_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_count": 0, "default_window": 0 }"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.default_count, 1);
        assert_eq!(settings.default_window, 1);
    }

    #[test]
    fn relative_base_folder_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "base_folder": "not/absolute" }"#).unwrap();

        let settings = load_settings_from(&path);
        assert!(PathBuf::from(&settings.base_folder).is_absolute());
    }
}
