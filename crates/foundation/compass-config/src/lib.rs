//! # Compass Config
//!
//! Layered client configuration:
//!
//! 1. Built-in defaults
//! 2. `config.yaml` in the Compass config directory (or `COMPASS_CONFIG`)
//! 3. Environment overrides (`COMPASS_API_BASE`, `COMPASS_TOKEN_KEY`,
//!    `COMPASS_STORE`, `COMPASS_LOG`)
//!
//! Later layers win. The API base is validated and stored without a
//! trailing slash so endpoint paths can be appended directly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default API base of a local catalog server
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

/// Key the bearer token is stored under
pub const DEFAULT_TOKEN_KEY: &str = "token";

pub const ENV_CONFIG: &str = "COMPASS_CONFIG";
pub const ENV_API_BASE: &str = "COMPASS_API_BASE";
pub const ENV_TOKEN_KEY: &str = "COMPASS_TOKEN_KEY";
pub const ENV_STORE: &str = "COMPASS_STORE";
pub const ENV_LOG: &str = "COMPASS_LOG";

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid API base '{0}': {1}")]
    InvalidApiBase(String, String),

    #[error("Token key must not be empty")]
    EmptyTokenKey,
}

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompassConfig {
    /// Root of every API endpoint, without trailing slash
    pub api_base: String,

    /// Key of the bearer token in the token store
    pub token_key: String,

    /// Path of the JSON key-value token store
    pub store_path: PathBuf,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

/// On-disk shape; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_base: Option<String>,
    token_key: Option<String>,
    store_path: Option<PathBuf>,
    log_filter: Option<String>,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            store_path: config_dir().join("store.json"),
            log_filter: "info".to_string(),
        }
    }
}

impl CompassConfig {
    /// Load from the default locations and the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(None, |key| std::env::var(key).ok())
    }

    /// Load with an explicit config file and environment lookup.
    ///
    /// `path` takes precedence over `COMPASS_CONFIG`. A missing file at the
    /// default location is not an error; a missing explicit file is.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        match explicit {
            Some(path) => config.apply_file(&path, true)?,
            None => config.apply_file(&config_dir().join("config.yaml"), false)?,
        }

        config.apply_env(&env);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path, required: bool) -> Result<()> {
        if !required && !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = if content.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };
        debug!(path = %path.display(), "loaded config file");

        if let Some(api_base) = file.api_base {
            self.api_base = api_base;
        }
        if let Some(token_key) = file.token_key {
            self.token_key = token_key;
        }
        if let Some(store_path) = file.store_path {
            self.store_path = store_path;
        }
        if let Some(log_filter) = file.log_filter {
            self.log_filter = log_filter;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = env(ENV_API_BASE) {
            self.api_base = api_base;
        }
        if let Some(token_key) = env(ENV_TOKEN_KEY) {
            self.token_key = token_key;
        }
        if let Some(store) = env(ENV_STORE) {
            self.store_path = PathBuf::from(store);
        }
        if let Some(filter) = env(ENV_LOG) {
            self.log_filter = filter;
        }
    }

    fn validate(&mut self) -> Result<()> {
        self.api_base = normalize_api_base(&self.api_base)?;
        if self.token_key.trim().is_empty() {
            return Err(ConfigError::EmptyTokenKey);
        }
        Ok(())
    }

    /// Override the API base after loading
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.api_base = normalize_api_base(api_base)?;
        Ok(self)
    }
}

/// Compass config directory (`~/.config/compass` on Linux)
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("compass")
}

/// Check that `raw` is an absolute http(s) URL and strip trailing slashes
pub fn normalize_api_base(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidApiBase(raw.to_string(), e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidApiBase(
                raw.to_string(),
                format!("unsupported scheme '{other}'"),
            ))
        }
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::InvalidApiBase(
            raw.to_string(),
            "must not carry a query or fragment".to_string(),
        ));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        let config = CompassConfig::load_with(Some(&path), no_env).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.token_key, DEFAULT_TOKEN_KEY);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "api_base: https://catalog.example.com/api/\ntoken_key: access_token\nlog_filter: debug\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [(ENV_LOG, "warn"), (ENV_STORE, "/tmp/compass.json")]
            .into_iter()
            .collect();
        let config =
            CompassConfig::load_with(Some(&path), |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_base, "https://catalog.example.com/api");
        assert_eq!(config.token_key, "access_token");
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.store_path, PathBuf::from("/tmp/compass.json"));
    }

    #[test]
    fn test_env_selects_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.yaml");
        std::fs::write(&path, "api_base: http://10.0.0.5:9000/api\n").unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = CompassConfig::load_with(None, |k| {
            (k == ENV_CONFIG).then(|| path_str.clone())
        })
        .unwrap();
        assert_eq!(config.api_base, "http://10.0.0.5:9000/api");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = CompassConfig::load_with(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api_base: [unterminated\n").unwrap();
        let err = CompassConfig::load_with(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_normalize_api_base() {
        assert_eq!(
            normalize_api_base("http://localhost:8000/api///").unwrap(),
            "http://localhost:8000/api"
        );
        assert!(normalize_api_base("ftp://example.com").is_err());
        assert!(normalize_api_base("not a url").is_err());
        assert!(normalize_api_base("http://x/api?debug=1").is_err());
    }

    #[test]
    fn test_empty_token_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "token_key: '  '\n").unwrap();
        let err = CompassConfig::load_with(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTokenKey));
    }
}
