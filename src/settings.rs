//! Tool configuration.
//!
//! Settings come from an optional YAML file (`relay.yml` by default) with
//! environment overrides on top: `GEMINI_API_KEY` and `GEMINI_API_URL`,
//! loaded through `.env` when one is present. The API key deliberately has
//! no file default; it only ever enters through the file or the
//! environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Level 2 model identifier.
    pub model: String,
    /// Base URL of the generative endpoint.
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Folder names excluded from prompts and from instruction targets.
    pub ignored_folders: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            ignored_folders: [".git", "node_modules", "dist", "build"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from `relay.yml` when present, or
    /// defaults, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new("relay.yml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Settings::default()
                }
            }
        };
        settings.apply_env(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GEMINI_API_URL").ok(),
        );
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    fn apply_env(&mut self, api_key: Option<String>, api_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::default();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert!(settings.api_key.is_none());
        assert!(settings.ignored_folders.iter().any(|f| f == "node_modules"));
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let yaml = "model: gemini-2.0-pro\nignored_folders:\n  - target\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.model, "gemini-2.0-pro");
        assert_eq!(settings.ignored_folders, vec!["target".to_string()]);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut settings = Settings {
            api_key: Some("from-file".to_string()),
            ..Settings::default()
        };
        settings.apply_env(Some("from-env".to_string()), Some("https://proxy.local".to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.api_url, "https://proxy.local");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut settings = Settings {
            api_key: Some("from-file".to_string()),
            ..Settings::default()
        };
        settings.apply_env(Some(String::new()), None);
        assert_eq!(settings.api_key.as_deref(), Some("from-file"));
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }
}
