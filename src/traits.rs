//! Collaborator traits: the two seams where muninn touches the outside.
//!
//! Muninn never executes tools or talks to storage itself. The surrounding
//! pipeline injects implementations of these traits at construction time
//! (see [`MuninnBuilder`](crate::MuninnBuilder)), which keeps the core
//! deterministic and lets tests substitute in-process fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Agent, ToolOutcome};
use crate::{Result, TopicContext};

/// External "execute agent tool" capability.
///
/// Implementations perform the actual I/O (API calls, device commands).
/// The speculative executor treats any `Err` the same as an unsuccessful
/// [`ToolOutcome`]: logged and dropped, never surfaced to the request.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `tool` with `args` on behalf of `user_id`, in the context
    /// of `agent`.
    async fn execute(
        &self,
        agent: Agent,
        tool: &str,
        args: &Value,
        user_id: &str,
    ) -> Result<ToolOutcome>;
}

/// External key/value store for per-thread topic context.
///
/// Whole-blob get/overwrite keyed by thread id. The tracker converts every
/// `Err` into "no context" (reads) or a logged no-op (writes); callers must
/// bound a stalling store themselves — the tracker imposes no timeout.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the stored context for a thread, `None` if the thread is new.
    async fn load(&self, thread_id: &str) -> Result<Option<TopicContext>>;

    /// Overwrite the stored context for a thread.
    async fn save(&self, thread_id: &str, context: &TopicContext) -> Result<()>;
}
