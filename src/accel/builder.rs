//! Builder for configuring accelerator instances

use std::collections::HashMap;
use std::sync::Arc;

use super::Accelerator;
use crate::cache::{CacheConfig, ResponseCache};
use crate::speculative::{SpeculativeConfig, SpeculativeExecutor, default_plans};
use crate::store::MemoryContextStore;
use crate::topic::TopicTracker;
use crate::traits::{ContextStore, ToolExecutor};
use crate::types::{Agent, PlannedCall};
use crate::{MuninnError, Result};

/// Main entry point for creating accelerator instances.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for configuring the accelerator.
    pub fn builder() -> MuninnBuilder {
        MuninnBuilder::new()
    }
}

/// Builder for configuring accelerator instances.
///
/// A tool executor is required; everything else has defaults. The context
/// store defaults to an in-process [`MemoryContextStore`].
pub struct MuninnBuilder {
    tool_executor: Option<Arc<dyn ToolExecutor>>,
    context_store: Option<Arc<dyn ContextStore>>,
    cache_config: CacheConfig,
    speculative_config: SpeculativeConfig,
    plans: HashMap<Agent, Vec<PlannedCall>>,
}

impl MuninnBuilder {
    pub fn new() -> Self {
        Self {
            tool_executor: None,
            context_store: None,
            cache_config: CacheConfig::default(),
            speculative_config: SpeculativeConfig::default(),
            plans: default_plans(),
        }
    }

    /// Inject the external tool capability (required).
    pub fn tool_executor(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tool_executor = Some(tools);
        self
    }

    /// Inject the external topic-context store.
    ///
    /// Defaults to [`MemoryContextStore`], which does not survive the
    /// process.
    pub fn context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.context_store = Some(store);
        self
    }

    /// Configure the response cache.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Configure the speculative executor.
    pub fn speculative_config(mut self, config: SpeculativeConfig) -> Self {
        self.speculative_config = config;
        self
    }

    /// Replace one agent's prefetch plan.
    ///
    /// An empty plan removes the agent from the table, so routing to it
    /// triggers no prefetch at all.
    pub fn plan(mut self, agent: Agent, calls: Vec<PlannedCall>) -> Self {
        if calls.is_empty() {
            self.plans.remove(&agent);
        } else {
            self.plans.insert(agent, calls);
        }
        self
    }

    /// Build the accelerator.
    pub fn build(self) -> Result<Accelerator> {
        let tools = self.tool_executor.ok_or(MuninnError::NoToolExecutor)?;
        let store = self
            .context_store
            .unwrap_or_else(|| Arc::new(MemoryContextStore::new()));

        Ok(Accelerator::new(
            Arc::new(ResponseCache::new(&self.cache_config)),
            Arc::new(SpeculativeExecutor::new(
                tools,
                self.speculative_config,
                self.plans,
            )),
            Arc::new(TopicTracker::new(store)),
        ))
    }
}

impl Default for MuninnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
