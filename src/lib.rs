//! Muninn - orchestration acceleration layer for multi-agent assistants
//!
//! An in-process library that sits between a message router and its
//! specialized responding agents, hiding latency without invoking a model:
//!
//! - [`ResponseCache`] — decides whether a previously computed agent answer
//!   can satisfy a new query, via exact, per-user, and semantic (embedding
//!   similarity) matching, with a hit-count/age hybrid eviction policy.
//! - [`SpeculativeExecutor`] — launches an agent's most likely tool calls
//!   in the background as soon as a routing decision lands, deduplicating
//!   in-flight work per user and supporting cooperative cancellation.
//! - [`TopicTracker`] — maintains a per-thread rolling summary of the
//!   conversation and supplies a routing bias from keyword overlap and
//!   explicit switch phrases.
//!
//! Classification, model inference, tool execution, and persistence are
//! external collaborators: the router's [`RoutingDecision`] is consumed,
//! tools run through an injected [`ToolExecutor`], topic context persists
//! through an injected [`ContextStore`], and embeddings are supplied
//! pre-computed by the caller. Nothing in this crate can fail the
//! surrounding request — every failure degrades to a cache miss or a
//! skipped optimization.
//!
//! # Example
//!
//! ```rust,ignore
//! use muninn::{Agent, CacheLookup, Muninn, RoutingDecision};
//!
//! # async fn pipeline(tools: std::sync::Arc<dyn muninn::ToolExecutor>) -> muninn::Result<()> {
//! let accel = Muninn::builder().tool_executor(tools).build()?;
//!
//! let decision = RoutingDecision::new(Agent::Home, 0.92, "device keywords");
//! let turn = accel
//!     .begin_turn(Some("thread-1"), "user-1", &decision, "turn on the lights")
//!     .await;
//!
//! if let Some(answer) = accel.cache().get(
//!     "turn on the lights",
//!     &CacheLookup { agent: Some(decision.agent), ..Default::default() },
//! ) {
//!     println!("{}", answer.response);
//! }
//! # Ok(())
//! # }
//! ```

pub mod accel;
pub mod cache;
pub mod error;
pub mod speculative;
pub mod store;
pub mod telemetry;
pub mod text;
pub mod topic;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use accel::{Accelerator, Muninn, MuninnBuilder, TurnHandle};
pub use cache::{
    CacheConfig, CacheLookup, CacheStats, CacheWrite, CachedAnswer, Invalidation, ResponseCache,
    WarmEntry,
};
pub use error::{MuninnError, Result};
pub use speculative::{
    CancellationHandle, SpeculativeConfig, SpeculativeExecutor, default_plans,
};
pub use store::MemoryContextStore;
pub use topic::TopicTracker;
pub use traits::{ContextStore, ToolExecutor};

// Re-export all types
pub use types::{
    Agent, PlannedCall, ResponseMetadata, RoutingContext, RoutingDecision, SpeculativeCoverage,
    SpeculativeResult, SpeculativeStats, ToolOutcome, TopicContext, TopicSwitch,
};
