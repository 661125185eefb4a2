//! Rule-based recommendation generation.
//!
//! A pure function of the behavioral and emotional analysis outputs. Rules
//! fire in a fixed order and contain no randomness, so the output is fully
//! determined by its inputs and safe to cache alongside them.

use super::models::{
    BehaviorPatterns, EmotionalPsychology, ImmediateRecommendations, LongtermRecommendations,
    Recommendations, SleepQuality,
};

/// Stability below this suggests working on emotional regulation.
const LOW_STABILITY_THRESHOLD: f64 = 0.5;

/// More stress periods than this warrants suggesting professional support.
const STRESS_PERIOD_LIMIT: usize = 5;

#[derive(Debug, Default, Clone)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        behavior: &BehaviorPatterns,
        emotional: &EmotionalPsychology,
    ) -> Recommendations {
        let mut immediate = ImmediateRecommendations {
            optimal_work_hours: Vec::new(),
            content_suggestions: vec![
                "Revisit the topics that appear most in your recent writing".to_string(),
            ],
            social_activities: vec![
                "Plan one in-person activity with friends this week".to_string(),
            ],
            wellness_tips: Vec::new(),
        };

        let mut longterm = LongtermRecommendations {
            hobby_development: vec![
                "Pick one recurring interest and dedicate weekly time to it".to_string(),
            ],
            career_direction: vec![
                "Review which activities consistently hold your attention".to_string(),
            ],
            relationship_improvement: vec![
                "Schedule regular check-ins with the people you message most".to_string(),
            ],
            personal_growth: Vec::new(),
        };

        // Rule order is fixed; tests depend on it.
        let active = &behavior.time_patterns.most_active_hours;
        if !active.is_empty() {
            let hours: Vec<String> = active.iter().map(|h| format!("{h}:00")).collect();
            immediate.optimal_work_hours.push(format!(
                "Schedule demanding work during your most active hours: {}",
                hours.join(", ")
            ));
        }

        if behavior.time_patterns.sleep_estimate.quality == SleepQuality::Poor {
            immediate.wellness_tips.push(
                "Your sleep window looks irregular; aim for a consistent 7-8 hour schedule"
                    .to_string(),
            );
        }

        if behavior.content_patterns.average_emotional_score < 0.0 {
            immediate.wellness_tips.push(
                "Recent activity trends negative; build in short daily stress-management breaks"
                    .to_string(),
            );
        }

        if emotional.emotional_stability < LOW_STABILITY_THRESHOLD {
            longterm.personal_growth.push(
                "Emotional swings are frequent; a regular journaling or mindfulness practice could help"
                    .to_string(),
            );
        }

        if emotional.stress_periods.len() > STRESS_PERIOD_LIMIT {
            immediate.wellness_tips.push(
                "Stress shows up often in your data; consider talking to a professional"
                    .to_string(),
            );
        }

        Recommendations {
            immediate,
            longterm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{EmotionalPsychology, SleepEstimate};
    use chrono::Utc;

    fn behavior_with_active_hours(hours: Vec<u32>) -> BehaviorPatterns {
        let mut behavior = BehaviorPatterns::default();
        behavior.time_patterns.most_active_hours = hours;
        behavior
    }

    #[test]
    fn test_optimal_hours_named_in_suggestion() {
        let engine = RecommendationEngine::new();
        let behavior = behavior_with_active_hours(vec![9, 14, 21]);
        let recs = engine.generate(&behavior, &EmotionalPsychology::default());

        assert_eq!(recs.immediate.optimal_work_hours.len(), 1);
        let text = &recs.immediate.optimal_work_hours[0];
        assert!(text.contains("9:00"));
        assert!(text.contains("14:00"));
        assert!(text.contains("21:00"));
    }

    #[test]
    fn test_no_active_hours_no_work_hour_suggestion() {
        let engine = RecommendationEngine::new();
        let recs = engine.generate(
            &BehaviorPatterns::default(),
            &EmotionalPsychology::default(),
        );

        assert!(recs.immediate.optimal_work_hours.is_empty());
    }

    #[test]
    fn test_poor_sleep_emits_wellness_tip() {
        let engine = RecommendationEngine::new();
        let mut behavior = BehaviorPatterns::default();
        behavior.time_patterns.sleep_estimate = SleepEstimate {
            start_hour: 2,
            end_hour: 5,
            duration_hours: 4,
            quality: SleepQuality::Poor,
        };
        let recs = engine.generate(&behavior, &EmotionalPsychology::default());

        assert!(recs.immediate.wellness_tips.iter().any(|t| t.contains("sleep")));
    }

    #[test]
    fn test_negative_emotion_emits_stress_tip() {
        let engine = RecommendationEngine::new();
        let mut behavior = BehaviorPatterns::default();
        behavior.content_patterns.average_emotional_score = -0.2;
        let recs = engine.generate(&behavior, &EmotionalPsychology::default());

        assert!(recs
            .immediate
            .wellness_tips
            .iter()
            .any(|t| t.contains("stress-management")));
    }

    #[test]
    fn test_low_stability_emits_growth_suggestion() {
        let engine = RecommendationEngine::new();
        let emotional = EmotionalPsychology {
            emotional_stability: 0.3,
            ..EmotionalPsychology::default()
        };
        let recs = engine.generate(&BehaviorPatterns::default(), &emotional);

        assert_eq!(recs.longterm.personal_growth.len(), 1);
    }

    #[test]
    fn test_many_stress_periods_suggest_support() {
        let engine = RecommendationEngine::new();
        let emotional = EmotionalPsychology {
            stress_periods: vec![Utc::now(); 6],
            ..EmotionalPsychology::default()
        };
        let recs = engine.generate(&BehaviorPatterns::default(), &emotional);

        assert!(recs
            .immediate
            .wellness_tips
            .iter()
            .any(|t| t.contains("professional")));
    }

    #[test]
    fn test_baseline_categories_never_empty() {
        let engine = RecommendationEngine::new();
        let recs = engine.generate(
            &BehaviorPatterns::default(),
            &EmotionalPsychology::default(),
        );

        assert!(!recs.immediate.content_suggestions.is_empty());
        assert!(!recs.immediate.social_activities.is_empty());
        assert!(!recs.longterm.hobby_development.is_empty());
        assert!(!recs.longterm.career_direction.is_empty());
        assert!(!recs.longterm.relationship_improvement.is_empty());
    }

    #[test]
    fn test_output_is_deterministic() {
        let engine = RecommendationEngine::new();
        let behavior = behavior_with_active_hours(vec![8]);
        let emotional = EmotionalPsychology::default();

        let a = engine.generate(&behavior, &emotional);
        let b = engine.generate(&behavior, &emotional);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
