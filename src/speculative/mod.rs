//! Speculative tool prefetching.
//!
//! When the external router picks an agent, [`executor::SpeculativeExecutor`]
//! launches that agent's most likely tool calls in the background, before
//! the responding logic asks for them. Results are held for a short window
//! ([`executor::RESULT_TTL`]); in-flight work is deduplicated per user and
//! per `(tool, args)` key; cancellation is cooperative — it discards a
//! result when it lands rather than aborting work in flight.
//!
//! Prefetch plans are static per-agent tables ([`executor::default_plans`]),
//! overridable through the builder. Agents without a plan trigger nothing.

pub mod executor;

pub use executor::{
    CancellationHandle, SpeculativeConfig, SpeculativeExecutor, default_plans,
    MAX_TOOLS_PER_DECISION, RESULT_TTL, WAIT_TIMEOUT,
};
