use std::env;

use crate::constants::{DEFAULT_DATABASE_PATH, DEFAULT_TOP_FILTER_LIMIT};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub top_filter_limit: usize,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path =
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let top_filter_limit: usize = lookup("TOP_FILTER_LIMIT")
            .map(|raw| raw.trim().parse::<usize>())
            .transpose()
            .map_err(|_| "Invalid TOP_FILTER_LIMIT")?
            .unwrap_or(DEFAULT_TOP_FILTER_LIMIT);

        if top_filter_limit == 0 {
            return Err("TOP_FILTER_LIMIT must be at least 1".to_string());
        }

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Config {
            database_path,
            top_filter_limit,
            environment,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            top_filter_limit: DEFAULT_TOP_FILTER_LIMIT,
            environment: "development".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.top_filter_limit, 3);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_PATH", "/tmp/x.redb"),
            ("TOP_FILTER_LIMIT", "5"),
            ("ENVIRONMENT", "test"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, "/tmp/x.redb");
        assert_eq!(config.top_filter_limit, 5);
        assert_eq!(config.environment, "test");
    }

    #[test]
    fn test_invalid_limit() {
        assert!(Config::from_lookup(lookup_from(&[("TOP_FILTER_LIMIT", "three")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("TOP_FILTER_LIMIT", "0")])).is_err());
    }
}
