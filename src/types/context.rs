//! Conversation topic state and switch-detection results.

use serde::{Deserialize, Serialize};

use super::Agent;

/// Rolling per-thread summary of what the conversation is about.
///
/// Persisted as a whole blob in the external [`ContextStore`](crate::ContextStore),
/// keyed by thread id. Created lazily on a thread's first message, mutated
/// every turn; deletion is the store owner's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicContext {
    /// Current topic label, e.g. `"home automation: lights, thermostat"`.
    /// Rewritten only when a switch is flagged or the label was empty.
    pub current_topic: String,
    /// Agent that handled the previous turn.
    pub last_agent: Agent,
    /// The 5 most recent agents, most-recent-first.
    pub recent_agents: Vec<Agent>,
    /// Up to 10 topic keywords, newest-first.
    pub topic_keywords: Vec<String>,
    /// Unix timestamp of the last update, in milliseconds.
    pub updated_at_ms: u64,
    /// Consecutive turns judged to be on the same topic.
    /// Resets to 1 on a switch, increments otherwise.
    pub topic_continuity: u32,
}

/// Outcome of topic-switch detection for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSwitch {
    /// Whether the message likely starts a new topic.
    pub is_switch: bool,
    /// Agent to keep routing to when continuity is detected. `None` on a
    /// switch — agent choice is deferred to the external router.
    pub suggested_agent: Option<Agent>,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f32,
    /// Which detection branch fired, for logs and diagnostics.
    pub reason: String,
}

impl TopicSwitch {
    /// The "nothing to go on" result: no history, no suggestion.
    pub fn no_history() -> Self {
        Self {
            is_switch: false,
            suggested_agent: None,
            confidence: 0.0,
            reason: "no history".into(),
        }
    }

    /// The result for a thread seen for the first time.
    pub fn new_thread() -> Self {
        Self {
            is_switch: false,
            suggested_agent: None,
            confidence: 0.0,
            reason: "new thread".into(),
        }
    }
}

/// Everything the routing pipeline needs from the tracker for one message:
/// the stored context (if any) and the switch verdict.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub topic_context: Option<TopicContext>,
    pub topic_switch: TopicSwitch,
}
