//! Suite configuration.
//!
//! Loaded from TOML, from `DOCKET_*` environment variables, or both (the
//! environment wins). Every field has a default, so an empty file is valid.
//!
//! # Example
//!
//! ```toml
//! probe_page_size = 1000
//! crud_categories = ["Save", "FindAll", "Count"]
//!
//! [rest]
//! base_url = "http://127.0.0.1:8080"
//! default_page_size = 20
//! timeout_secs = 30
//! profile_path = "profile"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConformanceError;
use crate::selector::{CrudCategory, RestCategory, Selection};

pub const DEFAULT_PROBE_PAGE_SIZE: usize = 1000;
pub const DEFAULT_REST_PAGE_SIZE: usize = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration of a conformance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Page size the direct store probe uses when a scenario asks for none.
    pub probe_page_size: usize,
    /// Repository-suite categories to run; absent means all.
    pub crud_categories: Option<Vec<CrudCategory>>,
    pub rest: RestConfig,
}

/// `[rest]` section: the HTTP resource layer under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Base URL of the resource server, without a trailing slash.
    pub base_url: Option<String>,
    /// Page size the server applies when a listing asks for none.
    pub default_page_size: usize,
    pub timeout_secs: u64,
    /// Path segment of the profile link, `{base}/{profile_path}/{resource}`.
    pub profile_path: String,
    /// Resource-suite categories to run; absent means all.
    pub categories: Option<Vec<RestCategory>>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            probe_page_size: DEFAULT_PROBE_PAGE_SIZE,
            crud_categories: None,
            rest: RestConfig::default(),
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_page_size: DEFAULT_REST_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            profile_path: "profile".to_string(),
            categories: None,
        }
    }
}

impl SuiteConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConformanceError> {
        let config: SuiteConfig = toml::from_str(content)
            .map_err(|e| ConformanceError::Config(format!("could not parse config: {e}")))?;
        config.validate()
    }

    /// Read and parse a TOML config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConformanceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConformanceError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)?.with_env_overrides()
    }

    /// Defaults overlaid with `DOCKET_*` environment variables.
    pub fn from_env() -> Result<Self, ConformanceError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConformanceError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConformanceError> {
        if let Some(url) = lookup("DOCKET_BASE_URL") {
            self.rest.base_url = Some(url);
        }
        if let Some(size) = lookup("DOCKET_PROBE_PAGE_SIZE") {
            self.probe_page_size = parse_number("DOCKET_PROBE_PAGE_SIZE", &size)?;
        }
        if let Some(size) = lookup("DOCKET_DEFAULT_PAGE_SIZE") {
            self.rest.default_page_size = parse_number("DOCKET_DEFAULT_PAGE_SIZE", &size)?;
        }
        if let Some(secs) = lookup("DOCKET_HTTP_TIMEOUT_SECS") {
            self.rest.timeout_secs = parse_number("DOCKET_HTTP_TIMEOUT_SECS", &secs)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConformanceError> {
        if self.probe_page_size == 0 {
            return Err(ConformanceError::Config(
                "probe_page_size must be positive".to_string(),
            ));
        }
        if self.rest.default_page_size == 0 {
            return Err(ConformanceError::Config(
                "rest.default_page_size must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn crud_selection(&self) -> Selection<CrudCategory> {
        Selection::from(self.crud_categories.clone())
    }

    pub fn rest_selection(&self) -> Selection<RestCategory> {
        Selection::from(self.rest.categories.clone())
    }
}

impl RestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The base URL, or a config error naming how to set it.
    pub fn require_base_url(&self) -> Result<&str, ConformanceError> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| {
                ConformanceError::Config(
                    "rest.base_url is not set (config file or DOCKET_BASE_URL)".to_string(),
                )
            })
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, ConformanceError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConformanceError::Config(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_config_uses_defaults() {
        let config = SuiteConfig::from_toml_str("").unwrap();
        assert_eq!(config, SuiteConfig::default());
        assert_eq!(config.probe_page_size, DEFAULT_PROBE_PAGE_SIZE);
        assert_eq!(config.rest.default_page_size, DEFAULT_REST_PAGE_SIZE);
        assert_eq!(config.crud_selection(), Selection::all());
    }

    #[test]
    fn parses_full_config() {
        let config = SuiteConfig::from_toml_str(
            r#"
            probe_page_size = 50
            crud_categories = ["Save", "Count"]

            [rest]
            base_url = "http://localhost:9000/"
            default_page_size = 5
            timeout_secs = 3
            categories = ["Create"]
            "#,
        )
        .unwrap();
        assert_eq!(config.probe_page_size, 50);
        assert_eq!(
            config.crud_selection(),
            Selection::only([CrudCategory::Save, CrudCategory::Count])
        );
        assert_eq!(
            config.rest_selection(),
            Selection::only([RestCategory::Create])
        );
        assert_eq!(
            config.rest.require_base_url().unwrap(),
            "http://localhost:9000"
        );
        assert_eq!(config.rest.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = SuiteConfig::from_toml_str("probe_page_size = 0").unwrap_err();
        assert!(err.to_string().contains("probe_page_size"), "{err}");
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(SuiteConfig::from_toml_str(r#"crud_categories = ["Upsert"]"#).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let vars: HashMap<&str, &str> = [
            ("DOCKET_BASE_URL", "http://10.0.0.1:8080"),
            ("DOCKET_DEFAULT_PAGE_SIZE", "7"),
        ]
        .into_iter()
        .collect();
        let config = SuiteConfig::from_toml_str("[rest]\ndefault_page_size = 3")
            .unwrap()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.rest.default_page_size, 7);
        assert_eq!(config.rest.base_url.as_deref(), Some("http://10.0.0.1:8080"));
    }

    #[test]
    fn malformed_override_is_an_error() {
        let err = SuiteConfig::default()
            .with_overrides(|key| (key == "DOCKET_PROBE_PAGE_SIZE").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DOCKET_PROBE_PAGE_SIZE"), "{err}");
    }

    #[test]
    fn missing_base_url_is_reported() {
        let err = SuiteConfig::default().rest.require_base_url().unwrap_err();
        assert!(err.to_string().contains("DOCKET_BASE_URL"), "{err}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.toml");
        std::fs::write(&path, "probe_page_size = 12\n").unwrap();
        let config = SuiteConfig::load(&path).unwrap();
        assert_eq!(config.probe_page_size, 12);
        assert!(SuiteConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}
