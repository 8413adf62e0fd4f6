//! Heuristic topic continuity over an external context store.
//!
//! The tracker's only I/O is whole-blob reads and writes of
//! [`TopicContext`] against the injected [`ContextStore`]; every store
//! failure is logged and degraded to "no context" — nothing here can fail
//! the surrounding request.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::telemetry;
use crate::text::extract_keywords;
use crate::traits::ContextStore;
use crate::types::{Agent, RoutingContext, TopicContext, TopicSwitch};

/// Keyword-overlap ratio above which a message clearly continues the topic.
pub const HIGH_OVERLAP: f32 = 0.3;

/// Keyword-overlap ratio below which a message is treated as a new topic.
pub const LOW_OVERLAP: f32 = 0.1;

/// Explicit switch markers, checked as case-insensitive substrings.
pub const SWITCH_PHRASES: &[&str] = &[
    "by the way",
    "btw",
    "changing topic",
    "different question",
    "unrelated",
    "also",
    "another thing",
    "speaking of",
    "on another note",
    "quick question",
];

/// Keywords extracted from a single message.
pub const MAX_MESSAGE_KEYWORDS: usize = 5;

/// Keywords retained in the rolling topic context.
pub const MAX_TOPIC_KEYWORDS: usize = 10;

/// Recent agents retained in the rolling topic context.
pub const RECENT_AGENT_WINDOW: usize = 5;

/// Keywords shown in a topic label.
const LABEL_KEYWORDS: usize = 3;

/// Per-thread topic continuity tracker.
pub struct TopicTracker {
    store: Arc<dyn ContextStore>,
}

impl TopicTracker {
    /// Create a tracker over the given context store.
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }

    /// Stored context for a thread. Store failures are logged and treated
    /// as "no context", never propagated.
    pub async fn context(&self, thread_id: &str) -> Option<TopicContext> {
        match self.store.load(thread_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(thread = %thread_id, error = %e, "context load failed, treating as no context");
                None
            }
        }
    }

    /// Fold one turn into the thread's topic context and persist it.
    ///
    /// A switch is flagged when the new agent differs from the previous
    /// last agent *and* the previous one was not the conversational
    /// fallback — drifting into or out of `personality` is not by itself a
    /// hard signal. The topic label is rewritten only on a switch (or when
    /// previously empty); the keyword set updates every turn regardless.
    pub async fn update(
        &self,
        thread_id: &str,
        agent: Agent,
        message: &str,
        existing: Option<TopicContext>,
    ) -> TopicContext {
        let mut recent_agents = vec![agent];
        if let Some(existing) = &existing {
            recent_agents.extend(existing.recent_agents.iter().copied());
            recent_agents.truncate(RECENT_AGENT_WINDOW);
        }

        let switched = existing
            .as_ref()
            .is_some_and(|c| c.last_agent != agent && !c.last_agent.is_fallback());

        let new_keywords = extract_keywords(message, MAX_MESSAGE_KEYWORDS);
        let mut topic_keywords = new_keywords.clone();
        if let Some(existing) = &existing {
            for keyword in &existing.topic_keywords {
                if !topic_keywords.contains(keyword) {
                    topic_keywords.push(keyword.clone());
                }
            }
            topic_keywords.truncate(MAX_TOPIC_KEYWORDS);
        }

        let topic_continuity = if switched {
            1
        } else {
            existing.as_ref().map_or(1, |c| c.topic_continuity + 1)
        };

        let previous_topic = existing.map(|c| c.current_topic).unwrap_or_default();
        let current_topic = if switched || previous_topic.is_empty() {
            topic_label(agent, &new_keywords)
        } else {
            previous_topic
        };

        let context = TopicContext {
            current_topic,
            last_agent: agent,
            recent_agents,
            topic_keywords,
            updated_at_ms: unix_millis(),
            topic_continuity,
        };

        if let Err(e) = self.store.save(thread_id, &context).await {
            warn!(thread = %thread_id, error = %e, "context save failed, continuing without persistence");
        }
        context
    }

    /// Judge whether `message` likely switches topic.
    ///
    /// Branch order and thresholds are load-bearing: downstream routing
    /// weights assume exactly these confidence bands.
    pub fn detect_switch(&self, message: &str, context: Option<&TopicContext>) -> TopicSwitch {
        let Some(context) = context.filter(|c| c.topic_continuity > 0) else {
            return TopicSwitch::no_history();
        };

        let message_keywords = extract_keywords(message, MAX_MESSAGE_KEYWORDS);
        let overlap = if message_keywords.is_empty() {
            0.0
        } else {
            let shared = message_keywords
                .iter()
                .filter(|k| context.topic_keywords.contains(k))
                .count();
            shared as f32 / message_keywords.len() as f32
        };

        let lowered = message.to_lowercase();
        let phrase = SWITCH_PHRASES.iter().find(|p| lowered.contains(*p));

        if overlap > HIGH_OVERLAP && phrase.is_none() {
            return TopicSwitch {
                is_switch: false,
                suggested_agent: Some(context.last_agent),
                confidence: 0.6 + 0.3 * overlap,
                reason: format!("keyword overlap {overlap:.2} continues the topic"),
            };
        }

        if let Some(phrase) = phrase {
            debug!(%phrase, "explicit topic switch phrase");
            metrics::counter!(telemetry::TOPIC_SWITCHES_TOTAL, "reason" => "phrase").increment(1);
            return TopicSwitch {
                is_switch: true,
                suggested_agent: None,
                confidence: 0.8,
                reason: format!("explicit switch phrase: \"{phrase}\""),
            };
        }
        if overlap < LOW_OVERLAP {
            metrics::counter!(telemetry::TOPIC_SWITCHES_TOTAL, "reason" => "low_overlap")
                .increment(1);
            return TopicSwitch {
                is_switch: true,
                suggested_agent: None,
                confidence: 0.5,
                reason: format!("keyword overlap {overlap:.2} below threshold"),
            };
        }

        TopicSwitch {
            is_switch: false,
            suggested_agent: Some(context.last_agent),
            confidence: 0.4,
            reason: format!("ambiguous keyword overlap {overlap:.2}"),
        }
    }

    /// Context plus switch verdict for the routing pipeline.
    ///
    /// A missing thread id means a brand-new thread: empty context and a
    /// "new thread" verdict, without touching the store.
    pub async fn routing_context(&self, thread_id: Option<&str>, message: &str) -> RoutingContext {
        let Some(thread_id) = thread_id else {
            return RoutingContext {
                topic_context: None,
                topic_switch: TopicSwitch::new_thread(),
            };
        };
        let topic_context = self.context(thread_id).await;
        let topic_switch = self.detect_switch(message, topic_context.as_ref());
        RoutingContext {
            topic_context,
            topic_switch,
        }
    }
}

/// `"<topic name>: kw1, kw2, kw3"`, or the topic name alone without keywords.
fn topic_label(agent: Agent, keywords: &[String]) -> String {
    if keywords.is_empty() {
        agent.topic_name().to_string()
    } else {
        format!(
            "{}: {}",
            agent.topic_name(),
            keywords[..keywords.len().min(LABEL_KEYWORDS)].join(", ")
        )
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
