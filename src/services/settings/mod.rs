// Settings service
// TOML configuration file resolved under the platform config directory

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// User-facing configuration for the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the scheduling backend.
    pub base_url: String,
    /// Placement algorithm the backend should run.
    pub algo: String,
    /// IANA timezone name for grid rotation; empty means UTC.
    pub timezone: String,
    /// Override path for the offline cache file.
    pub cache_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            algo: "greedy".to_string(),
            timezone: String::new(),
            cache_path: None,
        }
    }
}

impl Settings {
    /// Loads settings from the platform config directory, falling back to
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_file() else {
            log::warn!("no config directory available, using default settings");
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).context("invalid settings file")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_file().context("no config directory available")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, self.to_toml()?)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.base_url.is_empty(), "base_url must not be empty");
        anyhow::ensure!(!self.algo.is_empty(), "algo must not be empty");
        Ok(())
    }

    /// Path of the offline cache file: the configured override, or the
    /// platform data directory, or the working directory as a last resort.
    pub fn cache_file(&self) -> PathBuf {
        if let Some(path) = &self.cache_path {
            return PathBuf::from(path);
        }
        if let Some(dirs) = ProjectDirs::from("", "", "day-planner") {
            let data_dir = dirs.data_dir();
            if std::fs::create_dir_all(data_dir).is_ok() {
                return data_dir.join("planner.db");
            }
        }
        PathBuf::from("planner.db")
    }

    fn config_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "day-planner")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.algo, "greedy");
        assert!(settings.timezone.is_empty());
        assert!(settings.cache_path.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.base_url = "https://planner.example.com".to_string();
        settings.timezone = "Asia/Tokyo".to_string();

        let toml = settings.to_toml().unwrap();
        let parsed = Settings::from_toml(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed = Settings::from_toml("timezone = \"Europe/Paris\"\n").unwrap();
        assert_eq!(parsed.timezone, "Europe/Paris");
        assert_eq!(parsed.algo, "greedy");
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(Settings::from_toml("base_url = \"\"\n").is_err());
    }

    #[test]
    fn test_cache_path_override_wins() {
        let mut settings = Settings::default();
        settings.cache_path = Some("/tmp/custom.db".to_string());
        assert_eq!(settings.cache_file(), PathBuf::from("/tmp/custom.db"));
    }
}
