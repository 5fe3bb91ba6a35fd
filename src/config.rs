//! Engine configuration.
//!
//! Values come from code (builder-style setters), from environment
//! variables, or with the `config` feature from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::internal::MAX_DEPTH;

/// Limits applied by an [`App`](crate::App).
///
/// # Examples
///
/// ```
/// use screenflow::AppConfig;
///
/// let config = AppConfig::default()
///     .with_max_redirects(4)
///     .with_history_limit(50);
/// assert_eq!(config.max_redirects, 4);
/// assert_eq!(config.history_limit, Some(50));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AppConfig {
    /// Redirects one `go` call follows before failing with
    /// [`DiError::RedirectLimit`].
    pub max_redirects: usize,
    /// Deepest chain of nested service resolutions.
    pub max_resolution_depth: usize,
    /// Oldest history entries are dropped past this many; `None` keeps all.
    pub history_limit: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_redirects: 16,
            max_resolution_depth: MAX_DEPTH,
            history_limit: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Rejects limits that would make every transition fail.
    pub fn validate(&self) -> DiResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(DiError::Config("max_resolution_depth must be > 0".to_string()));
        }
        if self.history_limit == Some(0) {
            return Err(DiError::Config("history_limit must be > 0".to_string()));
        }
        Ok(())
    }

    /// Reads `<PREFIX>_MAX_REDIRECTS`, `<PREFIX>_MAX_RESOLUTION_DEPTH` and
    /// `<PREFIX>_HISTORY_LIMIT` on top of the defaults.
    pub fn from_env(prefix: &str) -> DiResult<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Like [`from_env`](AppConfig::from_env) with a custom variable source.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> DiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = prefix.to_uppercase();
        let read = |name: &str| -> DiResult<Option<usize>> {
            let key = format!("{}_{}", prefix, name);
            match lookup(&key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|_| DiError::Config(format!("{} is not a non-negative integer: {:?}", key, raw))),
            }
        };

        let mut config = Self::default();
        if let Some(value) = read("MAX_REDIRECTS")? {
            config.max_redirects = value;
        }
        if let Some(value) = read("MAX_RESOLUTION_DEPTH")? {
            config.max_resolution_depth = value;
        }
        if let Some(value) = read("HISTORY_LIMIT")? {
            config.history_limit = Some(value);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        let config: AppConfig = serde_json::from_str(json)
            .map_err(|err| DiError::Config(format!("Invalid JSON configuration: {}", err)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup("app", lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_resolution_depth, 1024);
    }

    #[test]
    fn prefix_is_uppercased() {
        let config = AppConfig::from_lookup(
            "shell",
            lookup(&[("SHELL_MAX_REDIRECTS", "3"), ("SHELL_HISTORY_LIMIT", " 20 ")]),
        )
        .unwrap();
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.history_limit, Some(20));
    }

    #[test]
    fn rejects_garbage_and_zero_limits() {
        let err = AppConfig::from_lookup("app", lookup(&[("APP_MAX_REDIRECTS", "many")])).unwrap_err();
        assert!(matches!(err, DiError::Config(msg) if msg.contains("APP_MAX_REDIRECTS")));

        let err = AppConfig::from_lookup("app", lookup(&[("APP_HISTORY_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, DiError::Config(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let config = AppConfig::from_json_str(r#"{ "max_redirects": 2 }"#).unwrap();
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.max_resolution_depth, 1024);
        assert!(AppConfig::from_json_str("{ nope").is_err());
    }
}
