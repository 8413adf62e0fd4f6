//! Public types for the Muninn API.

mod agent;
mod context;
mod tool;

pub use agent::{Agent, RoutingDecision};
pub use context::{RoutingContext, TopicContext, TopicSwitch};
pub use tool::{
    PlannedCall, ResponseMetadata, SpeculativeCoverage, SpeculativeResult, SpeculativeStats,
    ToolOutcome,
};
