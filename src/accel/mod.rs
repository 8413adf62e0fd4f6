//! Accelerator facade - wires the three services into the request pipeline.
//!
//! Per-message control flow: the external router proposes an agent →
//! [`Accelerator::begin_turn`] supplies the topic-continuity bias, records
//! the turn, and starts background prefetch → the responding logic consults
//! [`ResponseCache`] first, then the speculative results, before a live
//! call → [`Accelerator::complete_turn`] writes the final answer back into
//! the cache.

mod builder;

pub use builder::{Muninn, MuninnBuilder};

use std::sync::Arc;

use crate::cache::{CacheWrite, ResponseCache};
use crate::speculative::{CancellationHandle, SpeculativeExecutor};
use crate::topic::TopicTracker;
use crate::types::{Agent, RoutingContext, RoutingDecision};

/// Outcome of [`Accelerator::begin_turn`]: the routing bias for this
/// message and the handle for cancelling its prefetches.
pub struct TurnHandle {
    /// Stored topic context and switch verdict, to bias the router.
    pub routing: RoutingContext,
    /// Cancels this turn's speculative prefetches (cooperatively).
    pub cancellation: CancellationHandle,
}

/// The orchestration acceleration layer: response cache, speculative
/// prefetcher, and topic tracker behind one facade.
///
/// Explicitly constructed via [`Muninn::builder()`]; holds no global state,
/// so tests build isolated instances.
pub struct Accelerator {
    cache: Arc<ResponseCache>,
    speculative: Arc<SpeculativeExecutor>,
    topics: Arc<TopicTracker>,
}

impl Accelerator {
    pub(crate) fn new(
        cache: Arc<ResponseCache>,
        speculative: Arc<SpeculativeExecutor>,
        topics: Arc<TopicTracker>,
    ) -> Self {
        Self {
            cache,
            speculative,
            topics,
        }
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The speculative executor.
    pub fn speculative(&self) -> &SpeculativeExecutor {
        &self.speculative
    }

    /// The topic tracker.
    pub fn topics(&self) -> &TopicTracker {
        &self.topics
    }

    /// Run the start-of-turn pipeline for one message.
    ///
    /// Computes the routing context (without touching the store for a new
    /// thread), records the turn into the thread's topic context when a
    /// thread id is present, and starts background prefetch for the routed
    /// agent.
    pub async fn begin_turn(
        &self,
        thread_id: Option<&str>,
        user_id: &str,
        decision: &RoutingDecision,
        message: &str,
    ) -> TurnHandle {
        let routing = self.topics.routing_context(thread_id, message).await;
        if let Some(thread_id) = thread_id {
            self.topics
                .update(
                    thread_id,
                    decision.agent,
                    message,
                    routing.topic_context.clone(),
                )
                .await;
        }
        let cancellation = self.speculative.start(decision, user_id);
        TurnHandle {
            routing,
            cancellation,
        }
    }

    /// Write a successful agent answer back into the response cache.
    pub fn complete_turn(&self, query: &str, response: &str, agent: Agent, write: &CacheWrite<'_>) {
        self.cache.set(query, response, agent, write);
    }
}
