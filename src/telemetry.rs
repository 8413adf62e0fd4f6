//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `agent` — agent wire name (e.g. "home", "secretary")
//! - `match` — cache hit kind: "exact", "user" or "semantic"
//! - `tool` — tool name of a speculative call

/// Total response-cache hits.
///
/// Labels: `match` ("exact" | "user" | "semantic").
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total response-cache misses.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total response-cache evictions.
///
/// Labels: `kind` ("expired" | "cold").
pub const CACHE_EVICTIONS_TOTAL: &str = "muninn_cache_evictions_total";

/// Total speculative tool calls launched.
///
/// Labels: `agent`, `tool`.
pub const SPECULATIVE_LAUNCHES_TOTAL: &str = "muninn_speculative_launches_total";

/// Total speculative-cache hits (a prefetched result was consumed).
///
/// Labels: `tool`.
pub const SPECULATIVE_HITS_TOTAL: &str = "muninn_speculative_hits_total";

/// Total speculative-cache misses.
///
/// Labels: `tool`.
pub const SPECULATIVE_MISSES_TOTAL: &str = "muninn_speculative_misses_total";

/// Total speculative results discarded because the turn was cancelled
/// before the tool completed.
pub const SPECULATIVE_CANCELLED_TOTAL: &str = "muninn_speculative_cancelled_total";

/// Total hard topic switches detected.
///
/// Labels: `reason` ("phrase" | "low_overlap").
pub const TOPIC_SWITCHES_TOTAL: &str = "muninn_topic_switches_total";
