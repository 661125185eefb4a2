//! Normalization of uploaded records into typed data points.
//!
//! Each uploaded record yields exactly one [`PersonalDataPoint`], never
//! zero and never more than one. Dispatch is on MIME type:
//!
//! - `image/*` → [`DataType::Photo`], scored from pre-extracted scene
//!   features (neutral when absent)
//! - `application/json` → [`DataType::JsonData`], neutral emotion, full
//!   importance
//! - `text/*` → [`DataType::Document`], scored by a lexical polarity pass
//!
//! Records with any other MIME type fail normalization with
//! [`AnalysisError::InvalidRecord`]; the orchestrator skips and counts them
//! rather than aborting the batch.
//!
//! No I/O happens here. Content and features arrive pre-extracted from the
//! upstream parsers and vision collaborators.

use tracing::debug;
use uuid::Uuid;

use super::error::{AnalysisError, Result};
use super::models::{DataType, PersonalDataPoint, PointMetadata, UploadedRecord};

/// Scene-score keys emitted by the upstream vision collaborator.
mod scene {
    pub const HAPPY_MOMENT: &str = "happy_moment";
    pub const SAD_MOMENT: &str = "sad_moment";
    pub const PEOPLE: &str = "people";
    pub const TRAVEL: &str = "travel";
    pub const SOCIAL_GATHERING: &str = "social_gathering";
}

/// Importance weights for photo scene features.
const PEOPLE_WEIGHT: f64 = 0.4;
const TRAVEL_WEIGHT: f64 = 0.3;
const SOCIAL_WEIGHT: f64 = 0.3;

/// Lexical polarity word lists for plain-text scoring.
const POSITIVE_WORDS: &[&str] = &[
    "happy", "great", "love", "excellent", "good", "wonderful", "amazing", "joy", "excited",
    "success", "beautiful", "fun", "awesome", "proud", "grateful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "bad", "hate", "terrible", "awful", "angry", "fail", "worried", "stress", "tired",
    "anxious", "lonely", "upset", "fear", "pain",
];

/// Turns uploaded records into [`PersonalDataPoint`]s.
#[derive(Debug, Default, Clone)]
pub struct DataPointNormalizer;

impl DataPointNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single record. Exactly one point per record.
    pub fn normalize_record(&self, record: &UploadedRecord) -> Result<PersonalDataPoint> {
        let mime = record.mime_type.to_ascii_lowercase();

        let point = if mime.starts_with("image/") {
            self.normalize_photo(record)
        } else if mime == "application/json" {
            self.normalize_json(record)?
        } else if mime.starts_with("text/") {
            self.normalize_text(record)
        } else {
            return Err(AnalysisError::InvalidRecord {
                name: record.name.clone(),
                reason: format!("unsupported mime type '{}'", record.mime_type),
            });
        };

        debug!(
            name = %record.name,
            data_type = %point.data_type,
            emotional = point.emotional_score,
            importance = point.importance_score,
            "normalized record"
        );
        Ok(point)
    }

    fn normalize_photo(&self, record: &UploadedRecord) -> PersonalDataPoint {
        let (emotional, importance, metadata) = match &record.image_features {
            Some(features) => {
                let score = |key: &str| features.scene_scores.get(key).copied().unwrap_or(0.0);
                let emotional =
                    (score(scene::HAPPY_MOMENT) - score(scene::SAD_MOMENT)).clamp(-1.0, 1.0);
                let importance = PEOPLE_WEIGHT * score(scene::PEOPLE)
                    + TRAVEL_WEIGHT * score(scene::TRAVEL)
                    + SOCIAL_WEIGHT * score(scene::SOCIAL_GATHERING);
                let metadata = PointMetadata::Photo {
                    scene_scores: features.scene_scores.clone(),
                    dominant_colors: features.dominant_colors.clone(),
                    mood: features.mood.clone(),
                };
                (emotional, importance, metadata)
            }
            // No features extracted upstream: no signal, not an error.
            None => (0.0, 0.0, PointMetadata::None),
        };

        self.build_point(record, DataType::Photo, record.name.clone(), metadata, emotional, importance)
    }

    fn normalize_json(&self, record: &UploadedRecord) -> Result<PersonalDataPoint> {
        let (content, field_count) = match &record.parsed_content {
            Some(value) => {
                let field_count = match value {
                    serde_json::Value::Object(map) => map.len(),
                    serde_json::Value::Array(items) => items.len(),
                    _ => 1,
                };
                (serde_json::to_string(value)?, field_count)
            }
            None => (String::new(), 0),
        };

        Ok(self.build_point(
            record,
            DataType::JsonData,
            content,
            PointMetadata::Json { field_count },
            0.0,
            1.0,
        ))
    }

    fn normalize_text(&self, record: &UploadedRecord) -> PersonalDataPoint {
        let content = match &record.parsed_content {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let word_count = content.split_whitespace().count();
        let emotional = lexical_polarity(&content, word_count);
        // word_count/100 is uncapped and can exceed 1.0 for long documents.
        // This matches the upstream scoring and is relied on by consumers;
        // do not clamp it here.
        let importance = word_count as f64 / 100.0;

        self.build_point(
            record,
            DataType::Document,
            content,
            PointMetadata::Document { word_count },
            emotional,
            importance,
        )
    }

    fn build_point(
        &self,
        record: &UploadedRecord,
        data_type: DataType,
        content: String,
        metadata: PointMetadata,
        emotional_score: f64,
        importance_score: f64,
    ) -> PersonalDataPoint {
        PersonalDataPoint {
            id: Uuid::new_v4(),
            timestamp: record.last_modified,
            data_type,
            content,
            metadata,
            emotional_score,
            importance_score,
            source_file_id: Some(record.name.clone()),
        }
    }
}

/// Positive-minus-negative keyword count, normalized by word count and
/// clamped to [-1, 1]. Empty text scores 0.
fn lexical_polarity(text: &str, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }

    let lower = text.to_lowercase();
    let mut positive = 0usize;
    let mut negative = 0usize;

    for token in lower.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if POSITIVE_WORDS.contains(&token) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&token) {
            negative += 1;
        }
    }

    ((positive as f64 - negative as f64) / word_count as f64).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::ImageFeatures;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use std::collections::HashMap;

    fn record(name: &str, mime: &str) -> UploadedRecord {
        UploadedRecord {
            name: name.to_string(),
            size: 1024,
            mime_type: mime.to_string(),
            last_modified: Utc::now(),
            parsed_content: None,
            image_features: None,
        }
    }

    #[test]
    fn test_photo_without_features_is_neutral() {
        let normalizer = DataPointNormalizer::new();
        let point = normalizer
            .normalize_record(&record("beach.jpg", "image/jpeg"))
            .unwrap();

        assert_eq!(point.data_type, DataType::Photo);
        assert_eq!(point.emotional_score, 0.0);
        assert_eq!(point.importance_score, 0.0);
    }

    #[test]
    fn test_photo_scores_from_scene_features() {
        let normalizer = DataPointNormalizer::new();
        let mut rec = record("party.png", "image/png");
        let mut scores = HashMap::new();
        scores.insert("happy_moment".to_string(), 0.9);
        scores.insert("sad_moment".to_string(), 0.1);
        scores.insert("people".to_string(), 1.0);
        scores.insert("travel".to_string(), 0.5);
        scores.insert("social_gathering".to_string(), 0.5);
        rec.image_features = Some(ImageFeatures {
            scene_scores: scores,
            dominant_colors: vec!["blue".to_string()],
            mood: "warm".to_string(),
        });

        let point = normalizer.normalize_record(&rec).unwrap();
        assert_relative_eq!(point.emotional_score, 0.8);
        assert_relative_eq!(point.importance_score, 0.4 + 0.15 + 0.15);
    }

    #[test]
    fn test_json_record_full_importance() {
        let normalizer = DataPointNormalizer::new();
        let mut rec = record("export.json", "application/json");
        rec.parsed_content = Some(serde_json::json!({"a": 1, "b": 2}));

        let point = normalizer.normalize_record(&rec).unwrap();
        assert_eq!(point.data_type, DataType::JsonData);
        assert_eq!(point.emotional_score, 0.0);
        assert_eq!(point.importance_score, 1.0);
        match point.metadata {
            PointMetadata::Json { field_count } => assert_eq!(field_count, 2),
            other => panic!("unexpected metadata: {other:?}"),
        }
    }

    #[test]
    fn test_text_polarity_scoring() {
        let normalizer = DataPointNormalizer::new();
        let mut rec = record("journal.txt", "text/plain");
        rec.parsed_content = Some(serde_json::Value::String(
            "what a happy wonderful day full of joy".to_string(),
        ));

        let point = normalizer.normalize_record(&rec).unwrap();
        assert!(point.emotional_score > 0.0);
        assert!(point.emotional_score <= 1.0);
        // 8 words -> importance 0.08
        assert_relative_eq!(point.importance_score, 0.08);
    }

    #[test]
    fn test_long_document_importance_exceeds_one() {
        let normalizer = DataPointNormalizer::new();
        let mut rec = record("thesis.txt", "text/plain");
        let text = vec!["word"; 250].join(" ");
        rec.parsed_content = Some(serde_json::Value::String(text));

        let point = normalizer.normalize_record(&rec).unwrap();
        assert_relative_eq!(point.importance_score, 2.5);
    }

    #[test]
    fn test_unsupported_mime_is_invalid_record() {
        let normalizer = DataPointNormalizer::new();
        let err = normalizer
            .normalize_record(&record("song.mp3", "audio/mpeg"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRecord { .. }));
    }

    #[test]
    fn test_emotional_score_stays_bounded() {
        let normalizer = DataPointNormalizer::new();
        let mut rec = record("rant.txt", "text/plain");
        rec.parsed_content = Some(serde_json::Value::String(
            "hate hate hate hate".to_string(),
        ));

        let point = normalizer.normalize_record(&rec).unwrap();
        assert!(point.emotional_score >= -1.0);
        assert_relative_eq!(point.emotional_score, -1.0);
    }
}
