pub mod analysis;
pub mod cache;
pub mod config;
pub mod monitoring;
pub mod pipeline;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, falling back to `default_filter`. Intended
/// for embedding binaries and test harnesses; the library itself only
/// emits events. Errors if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

pub use config::Config;

// Re-export analysis types for convenience
pub use analysis::{
    AnalysisError, AnalysisResult, BehaviorPatterns, ContentPatternAnalyzer, DataPointNormalizer,
    DataType, EmotionalPsychology, EmotionalPsychologyAnalyzer, ImageFeatures, PersonalDataPoint,
    PointMetadata, RecommendationEngine, Recommendations, Result, TimePatternAnalyzer,
    UploadedRecord,
};

// Re-export cache types
pub use cache::{fingerprint, CacheEntry, CacheManager, CacheStats};

// Re-export monitoring types
pub use monitoring::{PerceivedPerformance, PerformanceMetrics, PerformanceMonitor, StepMetrics};

// Re-export the pipeline entry point
pub use pipeline::{PipelineOrchestrator, PipelineState};
