//! In-process [`ContextStore`] backed by a plain map.
//!
//! The default store wired in by [`MuninnBuilder`](crate::MuninnBuilder)
//! when no external store is injected, and the store used throughout the
//! test suite. State does not survive the process; production deployments
//! inject their own document-store implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::traits::ContextStore;
use crate::{Result, TopicContext};

/// Thread-safe in-memory context store. Never fails.
#[derive(Default)]
pub struct MemoryContextStore {
    entries: Mutex<HashMap<String, TopicContext>>,
}

impl MemoryContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads with stored context.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("context store lock poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn load(&self, thread_id: &str) -> Result<Option<TopicContext>> {
        Ok(self
            .entries
            .lock()
            .expect("context store lock poisoned")
            .get(thread_id)
            .cloned())
    }

    async fn save(&self, thread_id: &str, context: &TopicContext) -> Result<()> {
        self.entries
            .lock()
            .expect("context store lock poisoned")
            .insert(thread_id.to_string(), context.clone());
        Ok(())
    }
}
