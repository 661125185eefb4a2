//! Pipeline orchestration.
//!
//! One `run_analysis` call walks the state machine
//! `Idle → CacheCheck → Normalizing → Analyzing → Recommending → Done`,
//! short-circuiting `CacheCheck → Cached → Done` on a fingerprint hit and
//! landing in `Failed` on any unrecoverable stage error. Partial results
//! are never returned as success.
//!
//! Normalization fans out in chunks of `max_concurrent_files` worker
//! tasks; each chunk is awaited in full before the next starts, bounding
//! peak concurrency. The three analyzer stages then run strictly
//! sequentially: each needs the complete normalized point set.
//!
//! Cache failures degrade to always-miss and never fail the run.

use chrono::{Duration, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::analysis::error::Result;
use crate::analysis::models::{
    AnalysisResult, BehaviorPatterns, DataSummary, PersonalDataPoint, TimeRange, UploadedRecord,
};
use crate::analysis::{
    ContentPatternAnalyzer, DataPointNormalizer, EmotionalPsychologyAnalyzer,
    RecommendationEngine, TimePatternAnalyzer,
};
use crate::cache::{fingerprint, CacheManager, CacheStats};
use crate::config::Config;
use crate::monitoring::{PerformanceMetrics, PerformanceMonitor};

/// Analysis kind prefixed onto cache fingerprints.
pub const ANALYSIS_KIND: &str = "personal";

/// States of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CacheCheck,
    Normalizing,
    Analyzing,
    Recommending,
    Cached,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::CacheCheck => "cache_check",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Recommending => "recommending",
            PipelineState::Cached => "cached",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sequences normalization, analysis, recommendation, and caching.
///
/// The cache is injected rather than global so concurrent orchestrators can
/// share one instance and runs stay independently testable.
pub struct PipelineOrchestrator {
    config: Config,
    normalizer: Arc<DataPointNormalizer>,
    time_analyzer: TimePatternAnalyzer,
    content_analyzer: ContentPatternAnalyzer,
    emotional_analyzer: EmotionalPsychologyAnalyzer,
    recommendation_engine: RecommendationEngine,
    cache: Arc<CacheManager<AnalysisResult>>,
    last_metrics: Mutex<Option<PerformanceMetrics>>,
}

impl PipelineOrchestrator {
    pub fn new(config: Config, cache: Arc<CacheManager<AnalysisResult>>) -> Self {
        let time_analyzer =
            TimePatternAnalyzer::with_threshold_ratio(config.analysis.sleep_threshold_ratio);
        Self {
            config,
            normalizer: Arc::new(DataPointNormalizer::new()),
            time_analyzer,
            content_analyzer: ContentPatternAnalyzer::new(),
            emotional_analyzer: EmotionalPsychologyAnalyzer::new(),
            recommendation_engine: RecommendationEngine::new(),
            cache,
            last_metrics: Mutex::new(None),
        }
    }

    /// Build an orchestrator with a fresh cache from the config's cache
    /// section.
    pub fn with_config(config: Config) -> Self {
        let cache = Arc::new(CacheManager::new(
            config.cache.capacity,
            Duration::seconds(config.cache.ttl_seconds),
        ));
        Self::new(config, cache)
    }

    /// Run the full analysis pipeline over a batch of uploaded records.
    pub async fn run_analysis(&self, files: Vec<UploadedRecord>) -> Result<AnalysisResult> {
        let mut monitor = PerformanceMonitor::new();
        monitor.start_run(files.len());
        let mut state = PipelineState::Idle;

        self.transition(&mut state, PipelineState::CacheCheck);
        let key = fingerprint(ANALYSIS_KIND, &files);
        match self.cache.get(&key) {
            Ok(Some(cached)) => {
                self.transition(&mut state, PipelineState::Cached);
                info!(key = %key, "returning cached analysis result");
                self.transition(&mut state, PipelineState::Done);
                self.store_metrics(monitor.end_run());
                return Ok(cached);
            }
            Ok(None) => {}
            Err(err) => {
                // Degraded mode: treat every lookup as a miss.
                warn!(error = %err, "cache unavailable, bypassing");
            }
        }

        self.transition(&mut state, PipelineState::Normalizing);
        monitor.start_step("normalize");
        let (points, skipped) = self.normalize_files(&files).await;
        monitor.end_step("normalize");
        info!(
            normalized = points.len(),
            skipped,
            "normalization complete"
        );

        self.transition(&mut state, PipelineState::Analyzing);

        monitor.start_step("time_patterns");
        let time_patterns = self.time_analyzer.analyze(&points);
        monitor.end_step("time_patterns");

        monitor.start_step("content_patterns");
        let content_patterns = self.content_analyzer.analyze(&points);
        monitor.end_step("content_patterns");

        monitor.start_step("emotional_psychology");
        let emotional = match self.emotional_analyzer.analyze(&points) {
            Ok(emotional) => emotional,
            Err(err) => {
                monitor.end_step("emotional_psychology");
                self.transition(&mut state, PipelineState::Failed);
                error!(error = %err, "analysis stage failed, aborting run");
                self.store_metrics(monitor.end_run());
                return Err(err);
            }
        };
        monitor.end_step("emotional_psychology");

        let behavior_patterns = BehaviorPatterns {
            time_patterns,
            content_patterns,
        };

        self.transition(&mut state, PipelineState::Recommending);
        monitor.start_step("recommendations");
        let recommendations = self
            .recommendation_engine
            .generate(&behavior_patterns, &emotional);
        monitor.end_step("recommendations");

        let data_summary = summarize(&files, &points, skipped);
        let metrics = monitor.end_run();
        let processing_time_ms = metrics
            .as_ref()
            .map(|m| m.execution_time_ms)
            .unwrap_or_default();

        let result = AnalysisResult {
            data_summary,
            behavior_patterns,
            emotional_psychology: emotional,
            recommendations,
            processing_time_ms,
            analysis_timestamp: Utc::now(),
        };

        if let Err(err) = self.cache.set(key, result.clone()) {
            warn!(error = %err, "failed to store result in cache");
        }

        self.transition(&mut state, PipelineState::Done);
        self.store_metrics(metrics);
        Ok(result)
    }

    /// Telemetry from the most recent run, if any.
    pub fn last_metrics(&self) -> Option<PerformanceMetrics> {
        self.last_metrics.lock().ok().and_then(|m| m.clone())
    }

    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }

    /// Normalize in bounded chunks: each chunk's files run as parallel
    /// worker tasks and the whole chunk is awaited before the next starts.
    /// Per-file failures are skipped and counted, never fatal.
    async fn normalize_files(
        &self,
        files: &[UploadedRecord],
    ) -> (Vec<PersonalDataPoint>, usize) {
        let mut points = Vec::with_capacity(files.len());
        let mut skipped = 0usize;

        for chunk in files.chunks(self.config.pipeline.max_concurrent_files) {
            let handles: Vec<_> = chunk
                .iter()
                .cloned()
                .map(|record| {
                    let normalizer = Arc::clone(&self.normalizer);
                    tokio::spawn(async move { normalizer.normalize_record(&record) })
                })
                .collect();

            for joined in join_all(handles).await {
                match joined {
                    Ok(Ok(point)) => points.push(point),
                    Ok(Err(err)) => {
                        warn!(error = %err, "skipping record");
                        skipped += 1;
                    }
                    Err(err) => {
                        warn!(error = %err, "normalization task failed");
                        skipped += 1;
                    }
                }
            }
        }

        (points, skipped)
    }

    fn transition(&self, state: &mut PipelineState, next: PipelineState) {
        debug!(from = %state, to = %next, "pipeline transition");
        *state = next;
    }

    fn store_metrics(&self, metrics: Option<PerformanceMetrics>) {
        if let Ok(mut slot) = self.last_metrics.lock() {
            *slot = metrics;
        }
    }
}

fn summarize(
    files: &[UploadedRecord],
    points: &[PersonalDataPoint],
    skipped: usize,
) -> DataSummary {
    let mut types: BTreeMap<_, u64> = BTreeMap::new();
    for point in points {
        *types.entry(point.data_type).or_insert(0) += 1;
    }

    let time_range = match (
        points.iter().map(|p| p.timestamp).min(),
        points.iter().map(|p| p.timestamp).max(),
    ) {
        (Some(start), Some(end)) => Some(TimeRange { start, end }),
        _ => None,
    };

    DataSummary {
        file_count: files.len(),
        types,
        time_range,
        skipped_records: skipped,
    }
}
