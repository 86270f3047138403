//! Configuration loading and resolution
//!
//! Each setting resolves through a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix for all gatewatch settings
const ENV_PREFIX: &str = "GATEWATCH_";

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// HTTP bind address for the engine API
    pub bind_addr: String,
    /// Base URL of the gate message broker endpoint
    pub gate_endpoint: String,
    /// Topic the gate-open command is published to
    pub gate_topic: String,
    /// Default history window in days
    pub history_days: u32,
}

/// Partial settings, as parsed from CLI flags or a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub gate_endpoint: Option<String>,
    pub gate_topic: Option<String>,
    pub history_days: Option<u32>,
}

impl Settings {
    /// Resolve settings using the default config file location
    pub fn resolve(cli: &SettingsOverrides) -> Result<Settings> {
        let file = default_config_file();
        Self::resolve_with_file(cli, file.as_deref())
    }

    /// Resolve settings against an explicit config file path (None skips the
    /// file tier entirely)
    pub fn resolve_with_file(
        cli: &SettingsOverrides,
        config_file: Option<&Path>,
    ) -> Result<Settings> {
        let file = match config_file {
            Some(path) => load_config_file(path)?,
            None => SettingsOverrides::default(),
        };

        let settings = Settings {
            database_path: cli
                .database_path
                .clone()
                .or_else(|| env_var("DB").map(PathBuf::from))
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            bind_addr: cli
                .bind_addr
                .clone()
                .or_else(|| env_var("BIND"))
                .or(file.bind_addr)
                .unwrap_or_else(|| "127.0.0.1:5810".to_string()),
            gate_endpoint: cli
                .gate_endpoint
                .clone()
                .or_else(|| env_var("GATE_ENDPOINT"))
                .or(file.gate_endpoint)
                .unwrap_or_else(|| "http://127.0.0.1:8083".to_string()),
            gate_topic: cli
                .gate_topic
                .clone()
                .or_else(|| env_var("GATE_TOPIC"))
                .or(file.gate_topic)
                .unwrap_or_else(|| "gate/control".to_string()),
            history_days: cli
                .history_days
                .or_else(|| env_var("HISTORY_DAYS").and_then(|v| v.parse().ok()))
                .or(file.history_days)
                .unwrap_or(7),
        };

        if settings.history_days == 0 {
            return Err(Error::Config(
                "history_days must be at least 1".to_string(),
            ));
        }

        Ok(settings)
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}")).ok()
}

/// Parse a TOML config file into partial settings
fn load_config_file(path: &Path) -> Result<SettingsOverrides> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)))
}

/// Locate the platform config file, if one exists
///
/// Linux: ~/.config/gatewatch/config.toml, then /etc/gatewatch/config.toml.
/// Other platforms: the OS config directory.
fn default_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("gatewatch").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/gatewatch/config.toml");
        if system.exists() {
            return Some(system);
        }
    }
    None
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gatewatch"))
        .unwrap_or_else(|| PathBuf::from("./gatewatch_data"))
        .join("gatewatch.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Resolution reads GATEWATCH_* variables, so these tests are serialized

    #[test]
    #[serial]
    fn test_defaults_when_nothing_is_set() {
        let settings =
            Settings::resolve_with_file(&SettingsOverrides::default(), None).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:5810");
        assert_eq!(settings.gate_topic, "gate/control");
        assert_eq!(settings.history_days, 7);
    }

    #[test]
    #[serial]
    fn test_cli_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "bind_addr = \"0.0.0.0:9000\"\ngate_topic = \"t/file\"\n")
            .unwrap();

        let cli = SettingsOverrides {
            gate_topic: Some("t/cli".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve_with_file(&cli, Some(&file)).unwrap();
        // CLI wins where given, file fills the rest
        assert_eq!(settings.gate_topic, "t/cli");
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    #[serial]
    fn test_env_beats_file_and_loses_to_cli() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "gate_topic = \"t/file\"\n").unwrap();

        std::env::set_var("GATEWATCH_GATE_TOPIC", "t/env");

        let settings =
            Settings::resolve_with_file(&SettingsOverrides::default(), Some(&file)).unwrap();
        assert_eq!(settings.gate_topic, "t/env");

        let cli = SettingsOverrides {
            gate_topic: Some("t/cli".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve_with_file(&cli, Some(&file)).unwrap();
        assert_eq!(settings.gate_topic, "t/cli");

        std::env::remove_var("GATEWATCH_GATE_TOPIC");
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "history_days = 14\n").unwrap();

        let settings =
            Settings::resolve_with_file(&SettingsOverrides::default(), Some(&file)).unwrap();
        assert_eq!(settings.history_days, 14);
        assert_eq!(settings.gate_topic, "gate/control");
    }

    #[test]
    #[serial]
    fn test_missing_file_is_an_error() {
        let result = Settings::resolve_with_file(
            &SettingsOverrides::default(),
            Some(Path::new("/nonexistent/config.toml")),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_zero_history_window_rejected() {
        let cli = SettingsOverrides {
            history_days: Some(0),
            ..Default::default()
        };
        let result = Settings::resolve_with_file(&cli, None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
