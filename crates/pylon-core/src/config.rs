//! Console configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use pylon_client::ApiConfig;
use pylon_session::DEFAULT_PERSIST_KEY;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file backing durable storage
    pub database_path: PathBuf,
    /// Storage key of the mirrored profile/permission snapshot
    pub persist_key: String,
    /// Backend endpoint settings
    pub api: ApiConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("pylon.db"),
            persist_key: DEFAULT_PERSIST_KEY.to_string(),
            api: ApiConfig::default(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("pylon"))
            .unwrap_or_else(|| PathBuf::from(".pylon"))
    }

    /// Default configuration with `PYLON_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name:
    /// `PYLON_API_TARGET`, `PYLON_API_PREFIX`, `PYLON_DATABASE_PATH`,
    /// `PYLON_API_TIMEOUT_SECS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(target) = lookup("PYLON_API_TARGET") {
            self.api.proxy.target = Url::parse(&target)
                .map_err(|e| CoreError::Config(format!("PYLON_API_TARGET: {e}")))?;
        }

        if let Some(prefix) = lookup("PYLON_API_PREFIX") {
            if !prefix.starts_with('/') {
                return Err(CoreError::Config(format!(
                    "PYLON_API_PREFIX must start with '/': {prefix}"
                )));
            }
            self.api.proxy.prefix = prefix;
        }

        if let Some(path) = lookup("PYLON_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(timeout) = lookup("PYLON_API_TIMEOUT_SECS") {
            self.api.timeout_secs = timeout
                .parse()
                .map_err(|e| CoreError::Config(format!("PYLON_API_TIMEOUT_SECS: {e}")))?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/pylon-test"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/pylon-test/pylon.db"));
        assert_eq!(config.persist_key, "persist:user");
        assert_eq!(config.api.proxy.prefix, "/api");
        assert_eq!(config.api.proxy.target.as_str(), "http://localhost:3120/");
        assert!(config.api.proxy.strip_prefix);
    }

    #[test]
    fn test_default_data_dir() {
        let dir = Config::data_dir();
        assert!(dir.ends_with("pylon") || dir == PathBuf::from(".pylon"));
        assert_eq!(Config::default().database_path, dir.join("pylon.db"));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::new(PathBuf::from("/tmp/pylon-test"));
        config
            .apply_overrides(lookup(&[
                ("PYLON_API_TARGET", "https://console.example.com/"),
                ("PYLON_DATABASE_PATH", "/var/lib/pylon/state.db"),
                ("PYLON_API_TIMEOUT_SECS", "10"),
            ]))
            .unwrap();

        assert_eq!(
            config.api.proxy.target.as_str(),
            "https://console.example.com/"
        );
        assert_eq!(config.database_path, PathBuf::from("/var/lib/pylon/state.db"));
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = Config::new(PathBuf::from("/tmp/pylon-test"));

        let err = config
            .apply_overrides(lookup(&[("PYLON_API_TARGET", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));

        let err = config
            .apply_overrides(lookup(&[("PYLON_API_PREFIX", "api")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));

        let err = config
            .apply_overrides(lookup(&[("PYLON_API_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_config_serializes() {
        let config = Config::new(PathBuf::from("/tmp/pylon-test"));
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
