//! Keyword frequency and emotional-aggregate statistics.
//!
//! Keyword extraction runs over document and message points only; the
//! emotional aggregates (mean and population standard deviation) cover the
//! whole point set.

use std::collections::{BTreeMap, HashMap};

use super::models::{ContentPatterns, DataType, KeywordScore, PersonalDataPoint};

/// Maximum number of keywords reported.
const MAX_KEYWORDS: usize = 20;

/// Minimum token length after stop-word filtering.
const MIN_TOKEN_LEN: usize = 2;

/// English stop words excluded from keyword extraction.
const STOP_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "an", "in", "that", "have", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "will", "my", "one", "all", "would", "there", "their", "what",
    "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "can", "like",
    "no", "just", "him", "know", "take", "into", "your", "some", "could", "them", "see", "other",
    "than", "then", "now", "only", "its", "over", "also", "after", "use", "how", "our", "well",
    "way", "even", "because", "any", "these", "us", "is", "was", "are", "been", "has", "had",
    "were", "said", "did", "having", "may",
];

#[derive(Debug, Default, Clone)]
pub struct ContentPatternAnalyzer;

impl ContentPatternAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, points: &[PersonalDataPoint]) -> ContentPatterns {
        let mut volume_by_type: BTreeMap<DataType, u64> = BTreeMap::new();
        for point in points {
            *volume_by_type.entry(point.data_type).or_insert(0) += 1;
        }

        let (average, volatility) = emotional_aggregates(points);

        ContentPatterns {
            top_keywords: self.extract_keywords(points),
            average_emotional_score: average,
            emotional_volatility: volatility,
            volume_by_type,
        }
    }

    /// Term frequency over the textual corpus (documents and messages),
    /// lowercased, stop-worded, tokens >= 2 chars. Score is count over the
    /// total kept-token count.
    fn extract_keywords(&self, points: &[PersonalDataPoint]) -> Vec<KeywordScore> {
        let mut frequencies: HashMap<String, u64> = HashMap::new();
        let mut total_words = 0u64;

        for point in points {
            if !matches!(point.data_type, DataType::Document | DataType::Message) {
                continue;
            }
            for token in tokenize(&point.content) {
                *frequencies.entry(token).or_insert(0) += 1;
                total_words += 1;
            }
        }

        if total_words == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(String, u64)> = frequencies.into_iter().collect();
        // Tie-break alphabetically so output order is deterministic.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(keyword, count)| KeywordScore {
                keyword,
                score: count as f64 / total_words as f64,
            })
            .collect()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|token| token.to_lowercase())
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !STOP_WORDS.contains(&token.as_str()))
}

/// Mean and population standard deviation of emotional scores.
/// Both are 0 for an empty set; volatility is 0 for a single point.
fn emotional_aggregates(points: &[PersonalDataPoint]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }

    let n = points.len() as f64;
    let mean = points.iter().map(|p| p.emotional_score).sum::<f64>() / n;

    if points.len() <= 1 {
        return (mean, 0.0);
    }

    let variance = points
        .iter()
        .map(|p| {
            let delta = p.emotional_score - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::PointMetadata;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use uuid::Uuid;

    fn point(data_type: DataType, content: &str, emotional: f64) -> PersonalDataPoint {
        PersonalDataPoint {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            data_type,
            content: content.to_string(),
            metadata: PointMetadata::None,
            emotional_score: emotional,
            importance_score: 0.5,
            source_file_id: None,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_patterns() {
        let analyzer = ContentPatternAnalyzer::new();
        let patterns = analyzer.analyze(&[]);

        assert!(patterns.top_keywords.is_empty());
        assert_eq!(patterns.average_emotional_score, 0.0);
        assert_eq!(patterns.emotional_volatility, 0.0);
        assert!(patterns.volume_by_type.is_empty());
    }

    #[test]
    fn test_keywords_exclude_stop_words_and_short_tokens() {
        let analyzer = ContentPatternAnalyzer::new();
        let points = vec![point(
            DataType::Document,
            "the project meeting and the project review at 9",
            0.0,
        )];
        let patterns = analyzer.analyze(&points);

        let keywords: Vec<&str> = patterns
            .top_keywords
            .iter()
            .map(|k| k.keyword.as_str())
            .collect();
        assert!(keywords.contains(&"project"));
        assert!(!keywords.contains(&"the"));
        assert!(!keywords.contains(&"9"));
        // project=2 over 4 kept tokens (project, meeting, project, review)
        assert_relative_eq!(patterns.top_keywords[0].score, 0.5);
    }

    #[test]
    fn test_keywords_only_from_documents_and_messages() {
        let analyzer = ContentPatternAnalyzer::new();
        let points = vec![
            point(DataType::Photo, "sunset sunset sunset", 0.5),
            point(DataType::Message, "lunch plans", 0.2),
        ];
        let patterns = analyzer.analyze(&points);

        let keywords: Vec<&str> = patterns
            .top_keywords
            .iter()
            .map(|k| k.keyword.as_str())
            .collect();
        assert!(!keywords.contains(&"sunset"));
        assert!(keywords.contains(&"lunch"));
    }

    #[test]
    fn test_emotional_aggregates_population_stddev() {
        let analyzer = ContentPatternAnalyzer::new();
        let points = vec![
            point(DataType::Message, "", -1.0),
            point(DataType::Message, "", 1.0),
        ];
        let patterns = analyzer.analyze(&points);

        assert_relative_eq!(patterns.average_emotional_score, 0.0);
        assert_relative_eq!(patterns.emotional_volatility, 1.0);
    }

    #[test]
    fn test_single_point_has_zero_volatility() {
        let analyzer = ContentPatternAnalyzer::new();
        let points = vec![point(DataType::Document, "", 0.4)];
        let patterns = analyzer.analyze(&points);

        assert_relative_eq!(patterns.average_emotional_score, 0.4);
        assert_eq!(patterns.emotional_volatility, 0.0);
    }

    #[test]
    fn test_volume_by_type_counts_all_points() {
        let analyzer = ContentPatternAnalyzer::new();
        let points = vec![
            point(DataType::Photo, "", 0.0),
            point(DataType::Photo, "", 0.0),
            point(DataType::JsonData, "", 0.0),
        ];
        let patterns = analyzer.analyze(&points);

        assert_eq!(patterns.volume_by_type[&DataType::Photo], 2);
        assert_eq!(patterns.volume_by_type[&DataType::JsonData], 1);
    }

    #[test]
    fn test_keyword_list_capped_at_twenty() {
        let analyzer = ContentPatternAnalyzer::new();
        let corpus: String = (0..40).map(|i| format!("keyword{i} ")).collect();
        let points = vec![point(DataType::Document, &corpus, 0.0)];
        let patterns = analyzer.analyze(&points);

        assert_eq!(patterns.top_keywords.len(), 20);
    }
}
