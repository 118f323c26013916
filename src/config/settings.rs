//! Application settings loading from config.toml
//!
//! Settings are read from a TOML file whose sections are all optional; any
//! missing value falls back to its default. A handful of environment variables
//! (`DATABASE_URL`, `HOST`, `PORT`, `STORAGE_ROOT`) take precedence over the
//! file so the service can be configured from `.env` alone.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener and database location
    pub server: ServerSettings,
    /// Password and session policy
    pub auth: AuthSettings,
    /// Blob storage location
    pub storage: StorageSettings,
    /// Audit log paging defaults
    pub activities: ActivitySettings,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// `SeaORM` connection string
    pub database_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "sqlite://data/school_manager.sqlite?mode=rwc".to_string(),
        }
    }
}

/// `[auth]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Minimum accepted password length
    pub min_password_length: usize,
    /// Lifetime of a session token in hours
    pub session_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            session_ttl_hours: 24 * 7,
        }
    }
}

/// `[storage]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory for uploaded files
    pub root: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/blobs"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// `[activities]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    /// Page size for the activity listing
    pub page_size: u64,
    /// Number of entries in the recent-activity widget
    pub recent_limit: u64,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            recent_limit: 10,
        }
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `./config.toml` when present, defaults otherwise,
/// then applies environment overrides.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new("config.toml");
    let mut settings = if path.exists() {
        load_settings(path)?
    } else {
        tracing::info!("No config.toml found, using default settings");
        Settings::default()
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

/// Overrides settings with values from the environment.
///
/// The lookup is injected so tests do not need to mutate process state.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL") {
        settings.server.database_url = url;
    }
    if let Some(host) = lookup("HOST") {
        settings.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        settings.server.port = port.parse().map_err(|e| Error::Config {
            message: format!("Invalid PORT value {port:?}: {e}"),
        })?;
    }
    if let Some(root) = lookup("STORAGE_ROOT") {
        settings.storage.root = PathBuf::from(root);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_settings() {
        let toml_str = r#"
            [server]
            port = 9090

            [auth]
            min_password_length = 8
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.auth.min_password_length, 8);
        assert_eq!(settings.auth.session_ttl_hours, 168);
        assert_eq!(settings.activities.page_size, 20);
        assert_eq!(settings.activities.recent_limit, 10);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage.root, PathBuf::from("data/blobs"));
    }

    #[test]
    fn test_invalid_toml() {
        let result = parse_settings("[server\nport = 1");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "3000"),
            ("STORAGE_ROOT", "/tmp/blobs"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |k| env.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(settings.server.database_url, "sqlite::memory:");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.storage.root, PathBuf::from("/tmp/blobs"));
    }

    #[test]
    fn test_env_override_bad_port() {
        let mut settings = Settings::default();
        let result = apply_env_overrides(&mut settings, |k| {
            (k == "PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
