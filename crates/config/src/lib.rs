//! Configuration loading and validation.
//!
//! Values are merged from, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory (if it exists),
//! 3. an explicit file (`.toml`, `.yaml`/`.yml` or `.json`),
//! 4. `HNSAMPLE_`-prefixed environment variables, with `__` separating
//!    nested keys (`HNSAMPLE_API__TIMEOUT_SECS=3`).
//!
//! The sample size is deliberately absent: it is fixed at compile time.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use hnsample_source::backend::{DEFAULT_BASE_URL, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "HNSAMPLE_";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
}

/// Settings for the HTTP source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub user_agent: String,
}
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(explicit)?)
    }

    /// Assemble the provider stack without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
            tracing::debug!(path = %path.display(), "Merging platform configuration file");
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            // Figment treats missing files as empty, which is only right for
            // the optional platform file.
            if !path.is_file() {
                exn::bail!(ErrorKind::Load(format!("no such file: {}", path.display())));
            }
            tracing::debug!(path = %path.display(), "Merging explicit configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                other => exn::bail!(ErrorKind::UnsupportedFormat(other.unwrap_or_default().to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.validate()
    }

    /// `config.toml` in the platform configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "hnsample").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(mut self) -> Result<Self> {
        let base_url = self.api.base_url.trim_end_matches('/');
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            exn::bail!(ErrorKind::Invalid("api.base_url", format!("`{}` is not an http(s) URL", self.api.base_url)));
        }
        self.api.base_url = base_url.to_string();
        if self.api.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("api.timeout_secs", "must be at least 1".to_string()));
        }
        if self.api.max_concurrent_requests == 0 {
            exn::bail!(ErrorKind::Invalid("api.max_concurrent_requests", "must be at least 1".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_figment(Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "https://hacker-news.firebaseio.com/v0");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_override() {
        let config = from_toml(
            r#"
                [api]
                timeout_secs = 3
                base_url = "http://localhost:8080/v0/"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(config.api.base_url, "http://localhost:8080/v0");
        assert_eq!(config.api.max_concurrent_requests, DEFAULT_CONCURRENT_REQUESTS);
    }

    #[rstest]
    #[case("[api]\nbase_url = \"localhost\"", "api.base_url")]
    #[case("[api]\ntimeout_secs = 0", "api.timeout_secs")]
    #[case("[api]\nmax_concurrent_requests = 0", "api.max_concurrent_requests")]
    fn test_invalid_values(#[case] toml: &str, #[case] field: &str) {
        let err = from_toml(toml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(f, _) if *f == field), "unexpected error: {:?}", *err);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = from_toml("[api]\nsample_limit = 50").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }

    #[rstest]
    #[case("toml", "[api]\ntimeout_secs = 4\n")]
    #[case("yaml", "api:\n  timeout_secs: 4\n")]
    #[case("yml", "api:\n  timeout_secs: 4\n")]
    #[case("json", r#"{"api": {"timeout_secs": 4}}"#)]
    fn test_explicit_file(#[case] extension: &str, #[case] contents: &str) {
        let mut file = tempfile::Builder::new().suffix(&format!(".{extension}")).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let config = Config::from_figment(Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.api.timeout_secs, 4);
    }

    #[rstest]
    #[case(".ini", "ini")]
    #[case("", "")]
    fn test_unsupported_extension(#[case] suffix: &str, #[case] reported: &str) {
        let file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        let err = Config::figment(Some(file.path())).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(reported.to_string()));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::figment(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }
}
