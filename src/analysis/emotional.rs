//! Emotional and psychological profiling of the point set.
//!
//! Four estimates come out of this stage:
//!
//! - **Tertile clustering**: points sorted by emotional score and split into
//!   3 contiguous clusters of `ceil(n/3)` points each. Deterministic, not
//!   density-based.
//! - **Stress periods**: every point strictly below `mean - stddev`.
//! - **Stability**: `1 / (stddev + epsilon)`.
//! - **Recovery time**: for each point at or below `mean * 0.25`, hours
//!   until the first strictly-later point above that threshold; averaged,
//!   defaulting to 24h when no recovery is ever observed. The scan is
//!   O(n^2) worst case, fine for batches up to a few thousand points.

use chrono::Timelike;
use std::collections::BTreeMap;

use super::error::{AnalysisError, Result};
use super::models::{EmotionalCluster, EmotionalPsychology, PersonalDataPoint};

/// Added to the standard deviation before inverting, so uniform score sets
/// produce a large finite stability instead of dividing by zero.
pub const STABILITY_EPSILON: f64 = 0.001;

/// Ratio of the mean defining the low-emotion threshold for recovery.
const RECOVERY_LOW_RATIO: f64 = 0.25;

/// Reported recovery time when no low point ever recovers.
pub const DEFAULT_RECOVERY_HOURS: f64 = 24.0;

/// Number of clusters in the tertile partition.
const CLUSTER_COUNT: usize = 3;

/// Number of peak emotional hours reported.
const PEAK_HOUR_COUNT: usize = 5;

const STAGE_NAME: &str = "emotional_psychology";

#[derive(Debug, Default, Clone)]
pub struct EmotionalPsychologyAnalyzer;

impl EmotionalPsychologyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Profile the point set.
    ///
    /// Empty input returns the documented defaults (stability 1.0,
    /// recovery 24h, no clusters or stress periods). Non-finite emotional
    /// scores are rejected: they would poison every statistic downstream.
    pub fn analyze(&self, points: &[PersonalDataPoint]) -> Result<EmotionalPsychology> {
        if points.is_empty() {
            return Ok(EmotionalPsychology::default());
        }

        if points.iter().any(|p| !p.emotional_score.is_finite()) {
            return Err(AnalysisError::StageFailure {
                stage: STAGE_NAME.to_string(),
                message: "non-finite emotional score in input".to_string(),
            });
        }

        let n = points.len() as f64;
        let mean = points.iter().map(|p| p.emotional_score).sum::<f64>() / n;
        let variance = points
            .iter()
            .map(|p| {
                let delta = p.emotional_score - mean;
                delta * delta
            })
            .sum::<f64>()
            / n;
        let stddev = variance.sqrt();

        let stress_threshold = mean - stddev;
        let stress_periods = points
            .iter()
            .filter(|p| p.emotional_score < stress_threshold)
            .map(|p| p.timestamp)
            .collect();

        Ok(EmotionalPsychology {
            clusters: cluster_by_emotion(points),
            stress_periods,
            emotional_stability: 1.0 / (stddev + STABILITY_EPSILON),
            peak_emotional_hours: peak_emotional_hours(points),
            recovery_time_hours: recovery_time_hours(points, mean),
        })
    }
}

/// Tertile partition: sort by emotional score ascending, split into
/// contiguous clusters of `ceil(n/3)` points. Every point lands in exactly
/// one cluster; fewer than 3 clusters appear when n < 3.
fn cluster_by_emotion(points: &[PersonalDataPoint]) -> BTreeMap<u32, EmotionalCluster> {
    let mut sorted: Vec<&PersonalDataPoint> = points.iter().collect();
    sorted.sort_by(|a, b| a.emotional_score.total_cmp(&b.emotional_score));

    let chunk_size = points.len().div_ceil(CLUSTER_COUNT);
    let mut clusters = BTreeMap::new();

    for (id, chunk) in sorted.chunks(chunk_size).enumerate() {
        let size = chunk.len() as f64;
        let avg_emotion = chunk.iter().map(|p| p.emotional_score).sum::<f64>() / size;
        let avg_importance = chunk.iter().map(|p| p.importance_score).sum::<f64>() / size;

        let mut common_hours: Vec<u32> = chunk.iter().map(|p| p.timestamp.hour()).collect();
        common_hours.sort_unstable();
        common_hours.dedup();

        clusters.insert(
            id as u32,
            EmotionalCluster {
                size: chunk.len(),
                avg_emotion,
                avg_importance,
                common_hours,
            },
        );
    }

    clusters
}

/// Mean emotional score per hour, keeping the hours with the strongest
/// absolute signal.
fn peak_emotional_hours(points: &[PersonalDataPoint]) -> BTreeMap<u32, f64> {
    let mut by_hour: BTreeMap<u32, (f64, u64)> = BTreeMap::new();
    for point in points {
        let entry = by_hour.entry(point.timestamp.hour()).or_insert((0.0, 0));
        entry.0 += point.emotional_score;
        entry.1 += 1;
    }

    let mut means: Vec<(u32, f64)> = by_hour
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / count as f64))
        .collect();
    means.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(&b.0)));

    means.into_iter().take(PEAK_HOUR_COUNT).collect()
}

/// Mean hours from each low-emotion point to the first strictly-later point
/// above the low threshold, scanned in timestamp order.
fn recovery_time_hours(points: &[PersonalDataPoint], mean: f64) -> f64 {
    let low_threshold = mean * RECOVERY_LOW_RATIO;

    let mut ordered: Vec<&PersonalDataPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.timestamp);

    let mut deltas = Vec::new();
    for (i, low) in ordered.iter().enumerate() {
        if low.emotional_score > low_threshold {
            continue;
        }
        for later in &ordered[i + 1..] {
            if later.timestamp > low.timestamp && later.emotional_score > low_threshold {
                let hours = (later.timestamp - low.timestamp).num_seconds() as f64 / 3600.0;
                deltas.push(hours);
                break;
            }
        }
    }

    if deltas.is_empty() {
        DEFAULT_RECOVERY_HOURS
    } else {
        deltas.iter().sum::<f64>() / deltas.len() as f64
    }
}
