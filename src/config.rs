use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline concurrency settings
    pub pipeline: PipelineConfig,

    /// Result cache settings
    pub cache: CacheConfig,

    /// Analyzer tuning knobs
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Files normalized in parallel per chunk
    pub max_concurrent_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached analysis results before FIFO eviction
    pub capacity: usize,

    /// Entry time-to-live in seconds
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fraction of the mean hourly count at or below which an hour counts
    /// as sleep
    pub sleep_threshold_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: 5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: crate::cache::DEFAULT_CAPACITY,
            ttl_seconds: crate::cache::DEFAULT_TTL_SECONDS,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sleep_threshold_ratio: crate::analysis::time_patterns::SLEEP_THRESHOLD_RATIO,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let mut config = Config::default();

        if let Ok(value) = env::var("PERSONA_MAX_CONCURRENT_FILES") {
            config.pipeline.max_concurrent_files = value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PERSONA_MAX_CONCURRENT_FILES: {e}"))?;
        }

        if let Ok(value) = env::var("PERSONA_CACHE_CAPACITY") {
            config.cache.capacity = value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PERSONA_CACHE_CAPACITY: {e}"))?;
        }

        if let Ok(value) = env::var("PERSONA_CACHE_TTL_SECONDS") {
            config.cache.ttl_seconds = value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PERSONA_CACHE_TTL_SECONDS: {e}"))?;
        }

        if let Ok(value) = env::var("PERSONA_SLEEP_THRESHOLD_RATIO") {
            config.analysis.sleep_threshold_ratio = value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PERSONA_SLEEP_THRESHOLD_RATIO: {e}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_files == 0 {
            anyhow::bail!("max_concurrent_files must be at least 1");
        }
        if self.cache.capacity == 0 {
            anyhow::bail!("cache capacity must be at least 1");
        }
        if self.cache.ttl_seconds <= 0 {
            anyhow::bail!("cache ttl_seconds must be positive");
        }
        if !(0.0..=1.0).contains(&self.analysis.sleep_threshold_ratio) {
            anyhow::bail!("sleep_threshold_ratio must be within [0, 1]");
        }
        Ok(())
    }
}
