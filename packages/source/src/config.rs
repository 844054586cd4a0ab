//! Data source configuration.
//!
//! Defaults are embedded from `config/default.toml`. A different file can
//! be named with `CRISIS_MAP_CONFIG`, and individual values are overridden
//! by `CRISIS_MAP_SOURCE`, `CRISIS_MAP_API_URL` and
//! `CRISIS_MAP_TIMEOUT_SECS`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{ApiSource, CrisisSource, FixtureSource, SourceError};

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Which [`CrisisSource`] implementation to use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SourceKind {
    /// Remote HTTP API.
    Api,
    /// Embedded sample data.
    Fixture,
}

/// Data source configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Which source to use.
    pub kind: SourceKind,
    /// Base URL of the remote API (used when `kind = "api"`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    /// The embedded `config/default.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (caught by the test suite
    /// since the file is compiled in).
    fn default() -> Self {
        Self::parse(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default.toml: {e}"))
    }
}

impl SourceConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Toml`] if the document is invalid.
    pub fn parse(toml_str: &str) -> Result<Self, SourceError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Loads configuration from `CRISIS_MAP_CONFIG` (or the embedded
    /// defaults) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the config file or an override is invalid.
    pub fn from_env() -> Result<Self, SourceError> {
        let base = match std::env::var("CRISIS_MAP_CONFIG") {
            Ok(path) => {
                log::info!("Reading source config from {path}");
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if an override cannot be parsed.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SourceError> {
        if let Some(kind) = lookup("CRISIS_MAP_SOURCE") {
            self.kind = kind.trim().parse().map_err(|_| SourceError::Config {
                message: format!("CRISIS_MAP_SOURCE must be `api` or `fixture`, got `{kind}`"),
            })?;
        }

        if let Some(url) = lookup("CRISIS_MAP_API_URL") {
            self.base_url = url;
        }

        if let Some(secs) = lookup("CRISIS_MAP_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| SourceError::Config {
                message: format!("CRISIS_MAP_TIMEOUT_SECS must be an integer, got `{secs}`"),
            })?;
        }

        Ok(self)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Instantiates the configured source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the API client cannot be built or the
    /// base URL is empty.
    pub fn build(&self) -> Result<Box<dyn CrisisSource>, SourceError> {
        match self.kind {
            SourceKind::Fixture => Ok(Box::new(FixtureSource::new())),
            SourceKind::Api => {
                if self.base_url.trim().is_empty() {
                    return Err(SourceError::Config {
                        message: "base_url is required for the api source".to_string(),
                    });
                }
                Ok(Box::new(ApiSource::new(&self.base_url, self.timeout())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn embedded_default_parses() {
        let config = SourceConfig::default();
        assert_eq!(config.kind, SourceKind::Fixture);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn timeout_defaults_when_omitted() {
        let config = SourceConfig::parse("kind = \"api\"\nbase_url = \"http://x\"").unwrap();
        assert_eq!(config.kind, SourceKind::Api);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(SourceConfig::parse("kind = \"ftp\"\nbase_url = \"\"").is_err());
    }

    #[test]
    fn overrides_apply() {
        let config = SourceConfig::default()
            .with_overrides(env(&[
                ("CRISIS_MAP_SOURCE", "API"),
                ("CRISIS_MAP_API_URL", "https://crises.example.org"),
                ("CRISIS_MAP_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();

        assert_eq!(config.kind, SourceKind::Api);
        assert_eq!(config.base_url, "https://crises.example.org");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn invalid_overrides_are_config_errors() {
        let bad_kind = SourceConfig::default().with_overrides(env(&[("CRISIS_MAP_SOURCE", "db")]));
        assert!(matches!(bad_kind, Err(SourceError::Config { .. })));

        let bad_timeout =
            SourceConfig::default().with_overrides(env(&[("CRISIS_MAP_TIMEOUT_SECS", "soon")]));
        assert!(matches!(bad_timeout, Err(SourceError::Config { .. })));
    }

    #[test]
    fn builds_configured_source() {
        let fixture = SourceConfig::default().build().unwrap();
        assert_eq!(fixture.name(), "fixture");

        let mut api = SourceConfig::default();
        api.kind = SourceKind::Api;
        assert_eq!(api.build().unwrap().name(), "api");

        api.base_url = "  ".to_string();
        assert!(matches!(api.build(), Err(SourceError::Config { .. })));
    }
}
