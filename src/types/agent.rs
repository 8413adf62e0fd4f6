//! Agent identity and the external router's decision.

use serde::{Deserialize, Serialize};

/// One of the fixed set of specialized responders a message can be routed to.
///
/// `Personality` is the default conversational fallback: routing into or out
/// of it is never treated as a hard topic-switch signal, and it has no
/// speculative prefetch plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Coder,
    Researcher,
    Secretary,
    Home,
    Finance,
    Personality,
}

impl Agent {
    /// All agents, in declaration order. Used for agent-less exact cache
    /// probes, which try each qualified key in this order.
    pub const ALL: [Agent; 6] = [
        Agent::Coder,
        Agent::Researcher,
        Agent::Secretary,
        Agent::Home,
        Agent::Finance,
        Agent::Personality,
    ];

    /// Stable lowercase wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::Coder => "coder",
            Agent::Researcher => "researcher",
            Agent::Secretary => "secretary",
            Agent::Home => "home",
            Agent::Finance => "finance",
            Agent::Personality => "personality",
        }
    }

    /// Human topic name used as the prefix of topic labels
    /// (e.g. `"home automation: lights, thermostat"`).
    pub fn topic_name(&self) -> &'static str {
        match self {
            Agent::Coder => "coding",
            Agent::Researcher => "research",
            Agent::Secretary => "organization",
            Agent::Home => "home automation",
            Agent::Finance => "finances",
            Agent::Personality => "conversation",
        }
    }

    /// Whether this agent is the default conversational fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Agent::Personality)
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external classifier's routing choice for one message.
///
/// Consumed, never produced, by this crate: classification itself is an
/// external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The chosen responder.
    pub agent: Agent,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
    /// Human-readable rationale, for logs and debugging.
    pub rationale: String,
}

impl RoutingDecision {
    /// Convenience constructor for a decision.
    pub fn new(agent: Agent, confidence: f32, rationale: impl Into<String>) -> Self {
        Self {
            agent,
            confidence,
            rationale: rationale.into(),
        }
    }
}
