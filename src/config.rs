//! Configuration for the cache.
//!
//! # Example
//!
//! ```
//! use contentful_cache::CacheConfig;
//!
//! let config = CacheConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     ..CacheConfig::new("my-space", "my-access-token")
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::error::CacheError;

/// Configuration for the cache.
///
/// `space` and `access_token` are required; everything else has a sensible
/// default. Without a `redis_url` the cache runs over the in-memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Contentful space id
    #[serde(default)]
    pub space: String,

    /// Contentful delivery access token
    #[serde(default)]
    pub access_token: String,

    /// Contentful environment (default: "master")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Delivery API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Redis connection string (e.g., "redis://localhost:6379").
    /// None means the in-memory store.
    #[serde(default)]
    pub redis_url: Option<String>,
}

fn default_environment() -> String {
    "master".to_string()
}

fn default_api_url() -> String {
    "https://cdn.contentful.com".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            space: String::new(),
            access_token: String::new(),
            environment: default_environment(),
            api_url: default_api_url(),
            redis_url: None,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new(space: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Fail fast on missing required values, before any I/O.
    pub fn validate(&self) -> Result<(), CacheError> {
        let mut missing = Vec::new();
        if self.space.is_empty() {
            missing.push("space");
        }
        if self.access_token.is_empty() {
            missing.push("access_token");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Configuration(missing.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.environment, "master");
        assert_eq!(config.api_url, "https://cdn.contentful.com");
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(CacheConfig::new("space", "token").validate().is_ok());
    }

    #[test]
    fn test_validate_names_missing_values() {
        let err = CacheConfig::default().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("space"));
        assert!(msg.contains("access_token"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"space": "s", "access_token": "t"}"#).unwrap();
        assert_eq!(config.space, "s");
        assert_eq!(config.environment, "master");
    }
}
