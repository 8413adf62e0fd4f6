//! Tool-call types shared by the speculative executor and its callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

/// Result of executing an agent tool via the external capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the tool call succeeded. Unsuccessful outcomes are never
    /// cached by the speculative executor.
    pub success: bool,
    /// Opaque result payload.
    pub data: Value,
    /// Optional human-readable status or error message.
    pub message: Option<String>,
}

impl ToolOutcome {
    /// A successful outcome carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// A failed outcome with a message and no payload.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: Some(message.into()),
        }
    }
}

/// One entry of an agent's static prefetch plan.
#[derive(Debug, Clone)]
pub struct PlannedCall {
    /// Tool name, as understood by the external tool capability.
    pub tool: String,
    /// Argument mapping passed to the tool.
    pub args: Value,
    /// Selection priority; higher runs first, top 3 run at all.
    pub priority: u8,
}

impl PlannedCall {
    pub fn new(tool: impl Into<String>, args: Value, priority: u8) -> Self {
        Self {
            tool: tool.into(),
            args,
            priority,
        }
    }
}

/// A completed speculative tool call, held for a short validity window.
#[derive(Debug, Clone)]
pub struct SpeculativeResult {
    /// Tool that produced this result.
    pub tool: String,
    /// Arguments it was called with.
    pub args: Value,
    /// Opaque result payload from the tool.
    pub data: Value,
    /// Completion time; the result is valid while
    /// `now - completed_at < RESULT_TTL`.
    pub completed_at: Instant,
}

/// Diagnostic over a prospective tool plan: how much of it is already
/// answerable from the speculative cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeculativeCoverage {
    pub hits: usize,
    pub total: usize,
    pub hit_rate: f64,
}

/// Administrative snapshot of the speculative cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeculativeStats {
    /// Users with any cached or pending state.
    pub users: usize,
    /// Cached results across all users, including not-yet-purged expired ones.
    pub cached_results: usize,
    /// In-flight prefetches across all users.
    pub pending: usize,
}

/// Latency and token bookkeeping attached to a cached response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// How long the original agent answer took to produce.
    pub latency_ms: u64,
    /// Token usage of the original answer, when known.
    pub tokens: Option<u64>,
}
