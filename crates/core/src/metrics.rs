//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Intake (terminal outcome of every submission)
//! - Pipeline (stage runs and durations)
//! - Store (session writes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Intake Metrics
// =============================================================================

/// Intake submissions by terminal outcome.
pub static INTAKE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("focus_intake_outcomes_total", "Session intakes by outcome"),
        &["outcome"], // "persisted", "rejected", "processing_failed", "persistence_failed", "internal_failure"
    )
    .unwrap()
});

/// End-to-end intake duration in seconds.
pub static INTAKE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "focus_intake_duration_seconds",
            "Duration of a session intake from validation to persistence",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Stage runs by stage and result.
pub static STAGE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("focus_stage_runs_total", "Processing stage runs"),
        &["stage", "result"], // result: "success", "failed", "timeout"
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "focus_stage_duration_seconds",
            "Duration of processing stages",
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Store Metrics
// =============================================================================

/// Session store writes by result.
pub static STORE_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("focus_store_writes_total", "Session store writes"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Intake
        Box::new(INTAKE_OUTCOMES.clone()),
        Box::new(INTAKE_DURATION.clone()),
        // Pipeline
        Box::new(STAGE_RUNS.clone()),
        Box::new(STAGE_DURATION.clone()),
        // Store
        Box::new(STORE_WRITES.clone()),
    ]
}
