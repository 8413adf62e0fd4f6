//! Conversation topic tracking.
//!
//! [`tracker::TopicTracker`] keeps a per-thread rolling summary of what the
//! conversation is about and biases routing without invoking a model:
//! keyword overlap and a fixed phrase list decide whether a message
//! continues the current topic or likely starts a new one. Thresholds and
//! phrase lists are named constants in [`tracker`].

pub mod tracker;

pub use tracker::{
    TopicTracker, HIGH_OVERLAP, LOW_OVERLAP, MAX_MESSAGE_KEYWORDS, MAX_TOPIC_KEYWORDS,
    RECENT_AGENT_WINDOW, SWITCH_PHRASES,
};
