use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::header::{default_links, NavLink, SCROLL_THRESHOLD_PX};

/// Header look
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleVariant {
    /// Frosted, always opaque header
    #[default]
    Glass,
    /// Transparent over the hero, opaque once the page is scrolled
    Transparent,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub style_variant: StyleVariant,
    /// Skip smooth scrolling and indicator animation
    pub reduced_motion: bool,
    /// Scroll offset (px) after which the header counts as scrolled
    pub scroll_threshold_px: f64,
    /// Replacement link table; the built-in one is used when absent
    pub links: Option<Vec<NavLink>>,
    /// Extra translation fragments, merged in order after the built-in ones
    pub translations: Vec<PathBuf>,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style_variant: StyleVariant::default(),
            reduced_motion: false,
            scroll_threshold_px: SCROLL_THRESHOLD_PX,
            links: None,
            translations: Vec::new(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory.
    ///
    /// A missing file gives the defaults; an unreadable or invalid one is
    /// reported and also gives the defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Using default configuration: {e:#}");
                Config::default()
            }),
            Err(e) => {
                warn!("Using default configuration: {e:#}");
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        // Use XDG config directory standard or fallback to ~/.config
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else {
            home_dir.join(".config")
        };

        Ok(config_dir.join("gymx-header").join("config.json"))
    }

    /// Links to render. An empty override is rejected in favour of the
    /// built-in table so that one link can always be active.
    pub fn nav_links(&self) -> Vec<NavLink> {
        match &self.links {
            Some(links) if !links.is_empty() => links.clone(),
            Some(_) => {
                warn!("Configured link table is empty, using the built-in links");
                default_links()
            }
            None => default_links(),
        }
    }

    pub fn style_display(&self) -> &str {
        match self.style_variant {
            StyleVariant::Glass => "Glass",
            StyleVariant::Transparent => "Transparent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.style_variant, StyleVariant::Glass);
        assert!(!config.reduced_motion);
        assert_eq!(config.scroll_threshold_px, 8.0);
        assert!(config.links.is_none());
        assert!(config.translations.is_empty());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"style_variant": "transparent", "reduced_motion": true}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.style_variant, StyleVariant::Transparent);
        assert!(config.reduced_motion);
        assert_eq!(config.scroll_threshold_px, 8.0);
        assert_eq!(config.style_display(), "Transparent");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.style_variant, StyleVariant::Glass);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"style_variant": "neon"}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_empty_link_override_uses_builtin() {
        let config = Config {
            links: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(config.nav_links(), default_links());
    }

    #[test]
    fn test_link_override_is_used() {
        let json = r#"{"links": [{"anchor_id": "pricing", "label": {"en": "Pricing"}}]}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let links = config.nav_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].anchor_id, "pricing");
    }

    #[test]
    fn test_log_level_filter_strings() {
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }
}
