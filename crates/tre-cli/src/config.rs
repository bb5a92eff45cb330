//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tre_core::{DEFAULT_MAX_OCCURRENCES, ExpandOptions};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pinned reference date. When unset the local calendar date is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<NaiveDate>,

    /// Hard ceiling on occurrences printed per expansion.
    pub max_occurrences: usize,

    /// Emit JSON instead of human-readable output.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            today: None,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            json: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TRE_*)
        figment = figment.merge(Env::prefixed("TRE_"));

        figment.extract()
    }

    /// The date relative phrases resolve against.
    pub fn reference_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn expand_options(&self) -> ExpandOptions {
        ExpandOptions {
            max_occurrences: self.max_occurrences,
        }
    }
}

/// Returns the platform-specific config directory for tre.
///
/// On Linux: `~/.config/tre`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tre"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_tre() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tre");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.today.is_none());
        assert_eq!(config.max_occurrences, 10_000);
        assert!(!config.json);
    }

    #[test]
    fn test_pinned_today_is_the_reference_date() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let config = Config {
            today: Some(today),
            ..Config::default()
        };
        assert_eq!(config.reference_date(), today);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "today = \"2024-02-29\"").unwrap();
        writeln!(file, "max_occurrences = 5").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(config.expand_options().max_occurrences, 5);
    }
}
