//! Metric instrument factories for arete.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"arete"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for arete instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("arete")
}

/// Counter: XP grants written to the ledger.
/// Labels: `entity_type`, `source_type`, `result` ("ok" | "entity_error").
pub fn xp_granted() -> Counter<u64> {
    meter()
        .u64_counter("arete.xp.granted")
        .with_description("Number of XP grants written to the ledger")
        .build()
}

/// Counter: levels gained across all stats.
/// Labels: `entity_type`.
pub fn level_ups() -> Counter<u64> {
    meter()
        .u64_counter("arete.progression.level_ups")
        .with_description("Number of levels gained")
        .build()
}

/// Counter: per-stat award applications during task completion.
/// Labels: `result` ("ok" | "error").
pub fn awards_applied() -> Counter<u64> {
    meter()
        .u64_counter("arete.awards.applied")
        .with_description("Number of stat awards applied on task completion")
        .build()
}

/// Counter: tasks completed.
/// Labels: `source`.
pub fn tasks_completed() -> Counter<u64> {
    meter()
        .u64_counter("arete.tasks.completed")
        .with_description("Number of tasks marked completed")
        .build()
}

/// Counter: users visited by the generation sweep.
/// Labels: `result` ("ok" | "error").
pub fn sweep_users() -> Counter<u64> {
    meter()
        .u64_counter("arete.sweep.users")
        .with_description("Number of users processed by the generation sweep")
        .build()
}

/// Counter: content-generation requests.
/// Labels: `operation` ("level_title" | "suggest_tasks" | "weekly_summary"),
/// `result` ("ok" | "error").
pub fn llm_requests() -> Counter<u64> {
    meter()
        .u64_counter("arete.llm.requests")
        .with_description("Number of content-generation requests")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("arete.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
