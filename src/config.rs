//! Runtime configuration.
//!
//! Read from `$XDG_CONFIG_HOME/hnfeed/config.toml` (or the platform
//! equivalent). A missing file yields defaults; missing fields fall back to
//! their defaults as well. `HNFEED_BASE_URL` and `HNFEED_TIMEOUT_SECS`
//! override whatever the file says.
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1/search_by_date";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search endpoint; `?tags=story&page=N` is appended per request.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the default location and applies env overrides.
    pub fn load() -> Result<Self, Error> {
        let config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hnfeed").join("config.toml"))
    }

    /// Reads the file at `path`, returning defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, Error> {
        let config: Config =
            toml::from_str(content).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        if let Some(url) = var("HNFEED_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = var("HNFEED_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .map_err(|_| Error::Config(format!("HNFEED_TIMEOUT_SECS is not a number: {secs}")))?;
        }
        self.validate()
    }

    /// Checks the values a fetcher cannot work with.
    pub fn validate(self) -> Result<Self, Error> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than zero".into()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse("timeout_secs = 3\n").unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_invalid_toml() {
        let result = Config::parse("timeout_secs = \"soon\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::parse("timeout_secs = 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::from_file(Path::new("/nonexistent/hnfeed/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_overrides_win() {
        let config = Config::default()
            .with_overrides(|key| match key {
                "HNFEED_BASE_URL" => Some("http://localhost:8080/search".into()),
                "HNFEED_TIMEOUT_SECS" => Some("2".into()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/search");
        assert_eq!(config.timeout_secs, 2);
    }

    #[test]
    fn bad_timeout_override_is_an_error() {
        let result = Config::default().with_overrides(|key| {
            (key == "HNFEED_TIMEOUT_SECS").then(|| "never".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
