//! Response caching subsystem.
//!
//! [`response::ResponseCache`] decides whether a previously computed agent
//! answer can satisfy a new query, via three match tiers:
//!
//! - exact match on a normalized, agent-qualified key in the global cache;
//! - exact match in the querying user's private cache;
//! - semantic match by cosine similarity over caller-supplied embeddings,
//!   when enabled and strictly above the configured threshold.
//!
//! Eviction is a hit-count/age hybrid, not a pure recency LRU: at most one
//! entry is evicted per insert — the first expired entry found, otherwise
//! the coldest (fewest hits, ties broken by age). See [`response`] module
//! docs for the full policy and its deliberate gaps.

pub mod response;

pub use response::{
    CacheConfig, CacheLookup, CacheStats, CacheWrite, CachedAnswer, Invalidation, ResponseCache,
    WarmEntry,
};
