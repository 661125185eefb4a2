//! Per-run performance telemetry.
//!
//! One [`PerformanceMonitor`] instance wraps one pipeline run: steps are
//! opened and closed around each stage (nestable within the run), and
//! `end_run` finalizes a [`PerformanceMetrics`] snapshot that is read-only
//! from then on. Monitors are never shared across concurrent runs.
//!
//! Memory deltas come from process RSS sampling and report 0 on platforms
//! where that is unavailable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use sysinfo::System;
use tracing::{debug, warn};
use uuid::Uuid;

/// Total-duration thresholds for the perceived-performance buckets.
const EXCELLENT_MS: u64 = 1_000;
const GOOD_MS: u64 = 3_000;
const FAIR_MS: u64 = 10_000;

/// Coarse qualitative bucket for a run's total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceivedPerformance {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerceivedPerformance {
    pub fn classify(total_ms: u64) -> Self {
        if total_ms < EXCELLENT_MS {
            PerceivedPerformance::Excellent
        } else if total_ms < GOOD_MS {
            PerceivedPerformance::Good
        } else if total_ms < FAIR_MS {
            PerceivedPerformance::Fair
        } else {
            PerceivedPerformance::Poor
        }
    }
}

/// Telemetry for one instrumented pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    pub name: String,
    pub duration_ms: u64,
    pub memory_delta_mb: f64,
}

/// Finalized telemetry for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub run_id: Uuid,
    pub file_count: usize,
    pub started_at: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub memory_delta_mb: f64,
    pub steps: Vec<StepMetrics>,
    pub perceived: PerceivedPerformance,
}

#[derive(Debug)]
struct OpenStep {
    name: String,
    started: Instant,
    start_rss_mb: f64,
}

#[derive(Debug)]
struct ActiveRun {
    run_id: Uuid,
    file_count: usize,
    started_at: DateTime<Utc>,
    started: Instant,
    start_rss_mb: f64,
    steps: Vec<StepMetrics>,
    // Stack, so steps may nest within a run.
    open_steps: Vec<OpenStep>,
}

/// Wall-clock and memory telemetry for a single pipeline run.
#[derive(Debug)]
pub struct PerformanceMonitor {
    system: System,
    run: Option<ActiveRun>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            run: None,
        }
    }

    pub fn start_run(&mut self, file_count: usize) {
        let rss = self.current_rss_mb();
        let run_id = Uuid::new_v4();
        debug!(%run_id, file_count, "performance run started");
        self.run = Some(ActiveRun {
            run_id,
            file_count,
            started_at: Utc::now(),
            started: Instant::now(),
            start_rss_mb: rss,
            steps: Vec::new(),
            open_steps: Vec::new(),
        });
    }

    pub fn start_step(&mut self, name: &str) {
        let rss = self.current_rss_mb();
        if let Some(run) = self.run.as_mut() {
            run.open_steps.push(OpenStep {
                name: name.to_string(),
                started: Instant::now(),
                start_rss_mb: rss,
            });
        } else {
            warn!(step = name, "start_step called outside of a run");
        }
    }

    pub fn end_step(&mut self, name: &str) {
        let rss = self.current_rss_mb();
        let Some(run) = self.run.as_mut() else {
            warn!(step = name, "end_step called outside of a run");
            return;
        };

        // Innermost matching step first, so nested steps close correctly.
        let Some(pos) = run.open_steps.iter().rposition(|s| s.name == name) else {
            warn!(step = name, "end_step without matching start_step");
            return;
        };

        let open = run.open_steps.remove(pos);
        let duration_ms = open.started.elapsed().as_millis() as u64;
        debug!(step = name, duration_ms, "step completed");
        run.steps.push(StepMetrics {
            name: open.name,
            duration_ms,
            memory_delta_mb: rss - open.start_rss_mb,
        });
    }

    /// Finalize the run. Any steps still open are closed first.
    pub fn end_run(&mut self) -> Option<PerformanceMetrics> {
        let rss = self.current_rss_mb();
        let mut run = self.run.take()?;

        while let Some(open) = run.open_steps.pop() {
            warn!(step = %open.name, "step left open at end of run");
            run.steps.push(StepMetrics {
                name: open.name,
                duration_ms: open.started.elapsed().as_millis() as u64,
                memory_delta_mb: rss - open.start_rss_mb,
            });
        }

        let execution_time_ms = run.started.elapsed().as_millis() as u64;
        let metrics = PerformanceMetrics {
            run_id: run.run_id,
            file_count: run.file_count,
            started_at: run.started_at,
            execution_time_ms,
            memory_delta_mb: rss - run.start_rss_mb,
            steps: run.steps,
            perceived: PerceivedPerformance::classify(execution_time_ms),
        };
        debug!(
            run_id = %metrics.run_id,
            execution_time_ms,
            perceived = ?metrics.perceived,
            "performance run finished"
        );
        Some(metrics)
    }

    /// Current process RSS in megabytes, 0 when unavailable.
    fn current_rss_mb(&mut self) -> f64 {
        match sysinfo::get_current_pid() {
            Ok(pid) => {
                self.system.refresh_process(pid);
                self.system
                    .process(pid)
                    .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
                    .unwrap_or(0.0)
            }
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_perceived_performance_thresholds() {
        assert_eq!(
            PerceivedPerformance::classify(0),
            PerceivedPerformance::Excellent
        );
        assert_eq!(
            PerceivedPerformance::classify(999),
            PerceivedPerformance::Excellent
        );
        assert_eq!(
            PerceivedPerformance::classify(1_000),
            PerceivedPerformance::Good
        );
        assert_eq!(
            PerceivedPerformance::classify(2_999),
            PerceivedPerformance::Good
        );
        assert_eq!(
            PerceivedPerformance::classify(3_000),
            PerceivedPerformance::Fair
        );
        assert_eq!(
            PerceivedPerformance::classify(10_000),
            PerceivedPerformance::Poor
        );
    }

    #[test]
    fn test_run_lifecycle() {
        let mut monitor = PerformanceMonitor::new();
        monitor.start_run(3);
        monitor.start_step("normalize");
        thread::sleep(Duration::from_millis(5));
        monitor.end_step("normalize");

        let metrics = monitor.end_run().unwrap();
        assert_eq!(metrics.file_count, 3);
        assert_eq!(metrics.steps.len(), 1);
        assert_eq!(metrics.steps[0].name, "normalize");
        assert!(metrics.steps[0].duration_ms >= 5);
        assert!(metrics.execution_time_ms >= metrics.steps[0].duration_ms);
    }

    #[test]
    fn test_nested_steps_close_innermost_first() {
        let mut monitor = PerformanceMonitor::new();
        monitor.start_run(1);
        monitor.start_step("outer");
        monitor.start_step("inner");
        monitor.end_step("inner");
        monitor.end_step("outer");

        let metrics = monitor.end_run().unwrap();
        let names: Vec<&str> = metrics.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn test_unmatched_end_step_ignored() {
        let mut monitor = PerformanceMonitor::new();
        monitor.start_run(1);
        monitor.end_step("never_started");

        let metrics = monitor.end_run().unwrap();
        assert!(metrics.steps.is_empty());
    }

    #[test]
    fn test_open_steps_closed_at_end_of_run() {
        let mut monitor = PerformanceMonitor::new();
        monitor.start_run(1);
        monitor.start_step("left_open");

        let metrics = monitor.end_run().unwrap();
        assert_eq!(metrics.steps.len(), 1);
        assert_eq!(metrics.steps[0].name, "left_open");
    }

    #[test]
    fn test_end_run_without_start_returns_none() {
        let mut monitor = PerformanceMonitor::new();
        assert!(monitor.end_run().is_none());
    }
}
