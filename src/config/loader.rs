//! Configuration loading from disk.
//!
//! The file is a flat list of `KEY=value` assignments. Unknown keys are
//! ignored, recognized keys may appear in any order, and a repeated key keeps
//! its last value.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::Settings;

/// Source file path.
pub const KEY_SOURCE_PATH: &str = "linuxpath";
/// Reread-per-query toggle.
pub const KEY_REREAD_ON_QUERY: &str = "REREAD_ON_QUERY";
/// TLS toggle.
pub const KEY_TLS_ENABLED: &str = "SSL_ENABLED";
/// PEM certificate path.
pub const KEY_CERT_FILE: &str = "CERT_FILE";
/// PEM key path.
pub const KEY_KEY_FILE: &str = "KEY_FILE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => {
                write!(f, "cannot read configuration file {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
        }
    }
}

/// Read and parse a configuration file, surfacing I/O failures.
pub fn try_load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    Ok(parse_settings(&String::from_utf8_lossy(&bytes)))
}

/// Read and parse a configuration file.
///
/// An unreadable file is logged and yields `Settings::default()`, whose absent
/// source path makes startup refuse to serve.
pub fn load_settings(path: &Path) -> Settings {
    match try_load_settings(path) {
        Ok(settings) => settings,
        Err(ConfigError::Io(path, e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(path = %path.display(), "Configuration file not found");
            Settings::default()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error while reading the configuration file");
            Settings::default()
        }
    }
}

/// Parse `KEY=value` assignments into [`Settings`].
pub fn parse_settings(content: &str) -> Settings {
    let mut settings = Settings::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key {
            KEY_SOURCE_PATH => settings.source_path = parse_path(value),
            KEY_REREAD_ON_QUERY => settings.reread_on_query = parse_bool(value),
            KEY_TLS_ENABLED => settings.tls_enabled = parse_bool(value),
            KEY_CERT_FILE => settings.cert_path = parse_path(value),
            KEY_KEY_FILE => settings.key_path = parse_path(value),
            _ => {}
        }
    }

    settings
}

/// Only a case-insensitive `true` enables a flag.
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}
