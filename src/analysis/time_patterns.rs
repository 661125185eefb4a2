//! Hourly/daily activity histograms and sleep-window estimation.
//!
//! ## Sleep heuristic
//!
//! ```text
//! threshold = mean_hourly_count * sleep_threshold_ratio
//! sleep_hours = { h in 0..24 : count(h) <= threshold }
//! start = min(sleep_hours), end = max(sleep_hours)
//! duration = |sleep_hours|
//! ```
//!
//! The window is not a contiguous-interval search: two separate
//! low-activity windows (an afternoon nap and the night) merge into one
//! reported duration. This matches the upstream behavior exactly and is
//! kept on purpose; tests depend on it.

use chrono::{Datelike, Timelike, Weekday};
use std::collections::BTreeMap;

use super::models::{
    PersonalDataPoint, SleepEstimate, SleepQuality, TimePatterns, WeekendSplit,
};

/// Fraction of the mean hourly count at or below which an hour counts as
/// sleep.
pub const SLEEP_THRESHOLD_RATIO: f64 = 0.3;

/// Sleep durations inside this range classify as good quality.
const GOOD_SLEEP_HOURS: std::ops::RangeInclusive<u32> = 6..=9;

/// Maximum number of most-active hours reported.
const MAX_ACTIVE_HOURS: usize = 3;

#[derive(Debug, Clone)]
pub struct TimePatternAnalyzer {
    sleep_threshold_ratio: f64,
}

impl Default for TimePatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimePatternAnalyzer {
    pub fn new() -> Self {
        Self {
            sleep_threshold_ratio: SLEEP_THRESHOLD_RATIO,
        }
    }

    pub fn with_threshold_ratio(sleep_threshold_ratio: f64) -> Self {
        Self {
            sleep_threshold_ratio,
        }
    }

    /// Compute time patterns over the point set.
    ///
    /// Empty input returns the documented default: empty histograms and a
    /// 23:00-07:00 good-quality sleep window.
    pub fn analyze(&self, points: &[PersonalDataPoint]) -> TimePatterns {
        if points.is_empty() {
            return TimePatterns::default();
        }

        let mut hourly: BTreeMap<u32, u64> = BTreeMap::new();
        let mut daily: BTreeMap<String, u64> = BTreeMap::new();
        let mut split = WeekendSplit::default();

        for point in points {
            let hour = point.timestamp.hour();
            *hourly.entry(hour).or_insert(0) += 1;

            let weekday = point.timestamp.weekday();
            *daily.entry(weekday_name(weekday).to_string()).or_insert(0) += 1;

            if matches!(weekday, Weekday::Sat | Weekday::Sun) {
                split.weekend += 1;
            } else {
                split.weekday += 1;
            }
        }

        let most_active_hours = most_active_hours(&hourly);
        let sleep_estimate = self.estimate_sleep(&hourly, points.len());

        TimePatterns {
            hourly_activity: hourly,
            daily_activity: daily,
            weekend_vs_weekday: split,
            sleep_estimate,
            most_active_hours,
        }
    }

    fn estimate_sleep(&self, hourly: &BTreeMap<u32, u64>, total: usize) -> SleepEstimate {
        let mean = total as f64 / 24.0;
        let threshold = mean * self.sleep_threshold_ratio;

        // All 24 hours participate; hours with no activity count as zero.
        let sleep_hours: Vec<u32> = (0..24)
            .filter(|hour| hourly.get(hour).copied().unwrap_or(0) as f64 <= threshold)
            .collect();

        match (sleep_hours.first(), sleep_hours.last()) {
            (Some(&start), Some(&end)) => {
                let duration = sleep_hours.len() as u32;
                let quality = if GOOD_SLEEP_HOURS.contains(&duration) {
                    SleepQuality::Good
                } else {
                    SleepQuality::Poor
                };
                SleepEstimate {
                    start_hour: start,
                    end_hour: end,
                    duration_hours: duration,
                    quality,
                }
            }
            _ => SleepEstimate::default(),
        }
    }
}

/// Top hours by count, descending, ties broken by ascending hour.
fn most_active_hours(hourly: &BTreeMap<u32, u64>) -> Vec<u32> {
    let mut ranked: Vec<(u32, u64)> = hourly.iter().map(|(&h, &c)| (h, c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(MAX_ACTIVE_HOURS).map(|(h, _)| h).collect()
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
