//! Core data model for the personal data analysis pipeline.
//!
//! Everything here is plain data: the upstream record contract consumed by
//! the normalizer, the normalized `PersonalDataPoint`, and the derived
//! analysis outputs. Derived types are recomputed every run and never
//! mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Category of a normalized data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Message,
    Search,
    Photo,
    Document,
    Voice,
    JsonData,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Message => "message",
            DataType::Search => "search",
            DataType::Photo => "photo",
            DataType::Document => "document",
            DataType::Voice => "voice",
            DataType::JsonData => "json_data",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scene-level features extracted from an image by an upstream collaborator.
///
/// The pipeline never runs inference itself; these arrive pre-computed or
/// not at all. A missing map means "no signal", never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageFeatures {
    pub scene_scores: HashMap<String, f64>,
    pub dominant_colors: Vec<String>,
    pub mood: String,
}

/// One uploaded file as handed over by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedRecord {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub parsed_content: Option<serde_json::Value>,
    #[serde(default)]
    pub image_features: Option<ImageFeatures>,
}

/// Type-specific metadata attached to a data point.
///
/// The upstream system carried an untyped map here; the field names per
/// variant are preserved from that map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointMetadata {
    Photo {
        scene_scores: HashMap<String, f64>,
        dominant_colors: Vec<String>,
        mood: String,
    },
    Document {
        word_count: usize,
    },
    Json {
        field_count: usize,
    },
    None,
}

/// A normalized, timestamped unit of personal activity.
///
/// Created once by the normalizer and immutable thereafter; owned
/// exclusively by the analysis run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDataPoint {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub data_type: DataType,
    pub content: String,
    pub metadata: PointMetadata,
    /// Emotional polarity in [-1, 1].
    pub emotional_score: f64,
    /// Importance weight, >= 0. Document points use word_count/100 and can
    /// exceed 1.0; see the normalizer docs.
    pub importance_score: f64,
    pub source_file_id: Option<String>,
}

/// Estimated nightly sleep window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEstimate {
    pub start_hour: u32,
    pub end_hour: u32,
    pub duration_hours: u32,
    pub quality: SleepQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Good,
    Poor,
}

impl Default for SleepEstimate {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 7,
            duration_hours: 8,
            quality: SleepQuality::Good,
        }
    }
}

/// Weekend vs. weekday activity split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendSplit {
    pub weekend: u64,
    pub weekday: u64,
}

/// Time-of-day and day-of-week activity patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimePatterns {
    pub hourly_activity: BTreeMap<u32, u64>,
    pub daily_activity: BTreeMap<String, u64>,
    pub weekend_vs_weekday: WeekendSplit,
    pub sleep_estimate: SleepEstimate,
    /// Top hours by activity count, at most 3, ties broken by ascending hour.
    pub most_active_hours: Vec<u32>,
}

impl Default for TimePatterns {
    fn default() -> Self {
        Self {
            hourly_activity: BTreeMap::new(),
            daily_activity: BTreeMap::new(),
            weekend_vs_weekday: WeekendSplit::default(),
            sleep_estimate: SleepEstimate::default(),
            most_active_hours: Vec::new(),
        }
    }
}

/// A keyword with its relative frequency score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    pub keyword: String,
    pub score: f64,
}

/// Keyword and emotional-aggregate patterns over the point set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPatterns {
    /// Top keywords by term frequency, at most 20.
    pub top_keywords: Vec<KeywordScore>,
    pub average_emotional_score: f64,
    /// Population standard deviation of emotional scores, 0 for <= 1 point.
    pub emotional_volatility: f64,
    pub volume_by_type: BTreeMap<DataType, u64>,
}

/// Combined behavioral patterns for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorPatterns {
    pub time_patterns: TimePatterns,
    pub content_patterns: ContentPatterns,
}

/// One tertile cluster of points grouped by emotional score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalCluster {
    pub size: usize,
    pub avg_emotion: f64,
    pub avg_importance: f64,
    /// Distinct hours-of-day the cluster's points occurred in, ascending.
    pub common_hours: Vec<u32>,
}

/// Emotional and psychological profile derived from the point set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalPsychology {
    pub clusters: BTreeMap<u32, EmotionalCluster>,
    pub stress_periods: Vec<DateTime<Utc>>,
    /// 1 / (stddev + epsilon); higher is more stable.
    pub emotional_stability: f64,
    /// Mean emotional score for the hours with the strongest signal.
    pub peak_emotional_hours: BTreeMap<u32, f64>,
    pub recovery_time_hours: f64,
}

impl Default for EmotionalPsychology {
    fn default() -> Self {
        Self {
            clusters: BTreeMap::new(),
            stress_periods: Vec::new(),
            emotional_stability: 1.0,
            peak_emotional_hours: BTreeMap::new(),
            recovery_time_hours: 24.0,
        }
    }
}

/// Suggestions applicable right away.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImmediateRecommendations {
    pub optimal_work_hours: Vec<String>,
    pub content_suggestions: Vec<String>,
    pub social_activities: Vec<String>,
    pub wellness_tips: Vec<String>,
}

/// Suggestions on a months-to-years horizon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongtermRecommendations {
    pub hobby_development: Vec<String>,
    pub career_direction: Vec<String>,
    pub relationship_improvement: Vec<String>,
    pub personal_growth: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    pub immediate: ImmediateRecommendations,
    pub longterm: LongtermRecommendations,
}

/// Summary of the input batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSummary {
    pub file_count: usize,
    pub types: BTreeMap<DataType, u64>,
    pub time_range: Option<TimeRange>,
    /// Records that failed normalization and were skipped.
    pub skipped_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Complete output of one analysis run, stored verbatim in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub data_summary: DataSummary,
    pub behavior_patterns: BehaviorPatterns,
    pub emotional_psychology: EmotionalPsychology,
    pub recommendations: Recommendations,
    pub processing_time_ms: u64,
    pub analysis_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_string_mapping() {
        assert_eq!(DataType::JsonData.as_str(), "json_data");
        assert_eq!(DataType::Photo.to_string(), "photo");
    }

    #[test]
    fn test_sleep_estimate_default_window() {
        let sleep = SleepEstimate::default();
        assert_eq!(sleep.start_hour, 23);
        assert_eq!(sleep.end_hour, 7);
        assert_eq!(sleep.duration_hours, 8);
        assert_eq!(sleep.quality, SleepQuality::Good);
    }

    #[test]
    fn test_emotional_psychology_defaults() {
        let psych = EmotionalPsychology::default();
        assert_eq!(psych.emotional_stability, 1.0);
        assert_eq!(psych.recovery_time_hours, 24.0);
        assert!(psych.clusters.is_empty());
        assert!(psych.stress_periods.is_empty());
    }

    #[test]
    fn test_analysis_result_round_trips_through_json() {
        let result = AnalysisResult {
            data_summary: DataSummary::default(),
            behavior_patterns: BehaviorPatterns::default(),
            emotional_psychology: EmotionalPsychology::default(),
            recommendations: Recommendations::default(),
            processing_time_ms: 42,
            analysis_timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.processing_time_ms, 42);
    }
}
