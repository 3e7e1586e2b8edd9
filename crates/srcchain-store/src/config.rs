use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};

/// Settings for a [`ReadCache`](crate::ReadCache) layer.
///
/// ```toml
/// max_capacity = 4096
/// track_stats = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached slots. `None` leaves the cache unbounded.
    pub max_capacity: Option<usize>,
    /// Whether the cache keeps hit/miss counters.
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: None,
            track_stats: true,
        }
    }
}

impl CacheConfig {
    /// A bounded configuration with default settings otherwise.
    pub fn bounded(max_capacity: usize) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Self::default()
        }
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> SourceResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SourceError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML text.
    pub fn to_toml_string(&self) -> SourceResult<String> {
        toml::to_string(self).map_err(|e| SourceError::Configuration(e.to_string()))
    }

    pub fn validate(&self) -> SourceResult<()> {
        if self.max_capacity == Some(0) {
            return Err(SourceError::Configuration(
                "max_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = CacheConfig::default();
        assert_eq!(c.max_capacity, None);
        assert!(c.track_stats);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parse_toml() {
        let c = CacheConfig::from_toml_str("max_capacity = 128\ntrack_stats = false\n").unwrap();
        assert_eq!(c.max_capacity, Some(128));
        assert!(!c.track_stats);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let c = CacheConfig::from_toml_str("").unwrap();
        assert_eq!(c, CacheConfig::default());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = CacheConfig::from_toml_str("max_capacity = 0").unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = CacheConfig::from_toml_str("max_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let c = CacheConfig::bounded(64);
        let text = c.to_toml_string().unwrap();
        assert_eq!(CacheConfig::from_toml_str(&text).unwrap(), c);
    }
}
