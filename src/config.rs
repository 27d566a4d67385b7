//! Pipeline configuration

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::CELESTRAK_ACTIVE_URL;
use crate::error::{store_err, Error, Result};
use crate::propagation::{DEFAULT_ORBIT_SAMPLES, DEFAULT_PARALLEL_THRESHOLD};

/// Default cache location, `$HOME/.cache/orbitcast`
pub fn default_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("orbitcast")
}

/// Tunables for the ingestion, propagation and animation stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upstream element-set feed
    pub upstream_url: String,

    /// Directory holding the durable cache slot
    pub cache_dir: PathBuf,

    /// Key of the cache slot
    pub cache_key: String,

    /// Entries older than this are purged and refetched (seconds)
    pub cache_max_age_secs: u64,

    /// Interval between authoritative propagation batches (seconds)
    pub tick_period_secs: f64,

    /// Points per sampled orbit path
    pub orbit_path_samples: usize,

    /// Batches at least this large run on the rayon pool
    pub parallel_threshold: usize,

    /// Timeout for the upstream fetch (seconds)
    pub http_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upstream_url: CELESTRAK_ACTIVE_URL.to_string(),
            cache_dir: default_cache_dir(),
            cache_key: "tles".to_string(),
            cache_max_age_secs: 3600, // 1 hour
            tick_period_secs: 1.0,
            orbit_path_samples: DEFAULT_ORBIT_SAMPLES,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            http_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Frequent ticks for smooth close-up animation
    pub fn realtime() -> Self {
        Self {
            tick_period_secs: 0.25,
            ..Default::default()
        }
    }

    /// Cache-friendly settings for batch or offline runs
    pub fn offline(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            cache_max_age_secs: 6 * 3600,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| store_err(path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tick_period_secs.is_finite() || self.tick_period_secs <= 0.0 {
            return Err(Error::Config(format!(
                "tick_period_secs must be positive, got {}",
                self.tick_period_secs
            )));
        }
        if self.orbit_path_samples < 2 {
            return Err(Error::Config(format!(
                "orbit_path_samples must be at least 2, got {}",
                self.orbit_path_samples
            )));
        }
        if self.cache_max_age_secs == 0 {
            return Err(Error::Config("cache_max_age_secs must be non-zero".to_string()));
        }
        if self.cache_key.is_empty() {
            return Err(Error::Config("cache_key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_max_age_secs as i64)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_max_age_secs(mut self, secs: u64) -> Self {
        self.cache_max_age_secs = secs;
        self
    }

    pub fn with_tick_period_secs(mut self, secs: f64) -> Self {
        self.tick_period_secs = secs;
        self
    }

    pub fn with_orbit_path_samples(mut self, samples: usize) -> Self {
        self.orbit_path_samples = samples;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_key, "tles");
        assert_eq!(config.cache_max_age(), chrono::Duration::hours(1));
        assert_eq!(config.orbit_path_samples, 512);
        assert!(config.cache_dir.ends_with(".cache/orbitcast"));
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_validation() {
        let base = PipelineConfig::default();
        assert!(matches!(
            base.clone().with_tick_period_secs(0.0).validate(),
            Err(Error::Config(_))
        ));
        assert!(base.clone().with_tick_period_secs(f64::NAN).validate().is_err());
        assert!(base.clone().with_orbit_path_samples(1).validate().is_err());
        assert!(base.clone().with_cache_max_age_secs(0).validate().is_err());
        assert!(base.with_orbit_path_samples(2).validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_json() {
        let path = env::temp_dir().join(format!("orbitcast-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "tick_period_secs": 0.5, "cache_key": "active" }"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.tick_period_secs, 0.5);
        assert_eq!(config.cache_key, "active");
        assert_eq!(config.cache_max_age_secs, 3600);

        fs::write(&path, r#"{ "orbit_path_samples": 0 }"#).unwrap();
        assert!(matches!(PipelineConfig::from_file(&path), Err(Error::Config(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(PipelineConfig::from_file(&path), Err(Error::Config(_))));
        let _ = fs::remove_file(&path);

        assert!(matches!(
            PipelineConfig::from_file("/nonexistent/orbitcast.json"),
            Err(Error::Store { .. })
        ));
    }

    #[test]
    fn test_serde_roundtrip_of_presets() {
        let config = PipelineConfig::offline("/tmp/orbitcast");
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(PipelineConfig::realtime().tick_period_secs, 0.25);
    }
}
