//! Analysis stages of the personal data pipeline.
//!
//! Normalization turns uploaded records into typed data points; the three
//! analyzers derive time, content, and emotional patterns from the full
//! point set; the recommendation engine composes advice from those outputs.

pub mod content_patterns;
pub mod emotional;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod recommendations;
pub mod time_patterns;

pub use content_patterns::ContentPatternAnalyzer;
pub use emotional::EmotionalPsychologyAnalyzer;
pub use error::{AnalysisError, Result};
pub use models::{
    AnalysisResult, BehaviorPatterns, ContentPatterns, DataSummary, DataType, EmotionalCluster,
    EmotionalPsychology, ImageFeatures, KeywordScore, PersonalDataPoint, PointMetadata,
    Recommendations, SleepEstimate, SleepQuality, TimePatterns, TimeRange, UploadedRecord,
};
pub use normalizer::DataPointNormalizer;
pub use recommendations::RecommendationEngine;
pub use time_patterns::TimePatternAnalyzer;
