//! Semantic response cache for agent answers.
//!
//! [`ResponseCache`] sits in front of live agent calls: the pipeline asks it
//! first, falls back to speculative prefetch results, then to a live call,
//! and writes the final answer back in. It performs no I/O, never suspends,
//! and never errors — absence is always expressed as a miss.
//!
//! # Eviction policy
//!
//! At most one eviction per insert: scan the global map and delete the first
//! already-expired entry found; if none is expired, delete the entry with
//! the fewest hits, breaking ties by oldest creation time. Expired entries
//! are otherwise left in place — lookups skip them, and the next insert at
//! capacity reclaims one.
//!
//! # Known gap: per-user caches are unbounded
//!
//! Entries written with a user id land in that user's private map, which is
//! exempt from the capacity cap and from eviction. Across many users this
//! can grow without bound; changing it would alter observable capacity
//! behaviour, so the gap is documented rather than fixed.
//!
//! # Clock
//!
//! Timestamps use [`tokio::time::Instant`], so TTL behaviour is driven by
//! the paused tokio clock in tests (`start_paused` + `advance`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;
use crate::text::{contains_phrase, cosine_similarity};
use crate::types::{Agent, ResponseMetadata};

/// TTL applied to entries inserted through [`ResponseCache::warm`].
pub const WARM_TTL: Duration = Duration::from_secs(3600);

/// Short TTLs for common volatile query shapes, matched by whole-word
/// phrase containment against the normalized query. First match wins;
/// consulted only when `set` gets no explicit TTL override.
const COMMON_QUERY_TTLS: &[(&[&str], Duration)] = &[
    // Greetings: worth caching, but only briefly.
    (
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
        Duration::from_millis(60_000),
    ),
    // Clock/calendar questions go stale almost immediately.
    (
        &["what time", "what day", "what date", "time is it"],
        Duration::from_secs(30),
    ),
    (&["weather", "forecast"], Duration::from_secs(120)),
    // Closings.
    (
        &["bye", "goodbye", "good night", "thanks", "thank you"],
        Duration::from_secs(60),
    ),
];

/// Configuration for the response cache.
///
/// ```rust
/// # use muninn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(5_000)
///     .default_ttl(Duration::from_secs(600))
///     .similarity_threshold(0.9);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the global cache. Default: 1,000.
    pub max_entries: usize,
    /// TTL for entries with no override and no pattern match. Default: 5 min.
    pub default_ttl: Duration,
    /// Cosine-similarity threshold for a semantic hit, in `[0, 1]`.
    /// A hit requires a score *strictly above* this. Default: 0.85.
    pub similarity_threshold: f32,
    /// Whether the semantic (embedding) tier is consulted at all.
    /// Default: true.
    pub semantic_matching: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl: Duration::from_secs(300),
            similarity_threshold: 0.85,
            semantic_matching: true,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of global entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the default time-to-live.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the semantic-match similarity threshold.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Enable or disable semantic matching.
    pub fn semantic_matching(mut self, enabled: bool) -> Self {
        self.semantic_matching = enabled;
        self
    }
}

/// Optional parameters for [`ResponseCache::get`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheLookup<'a> {
    /// Agent the query was routed to. Without it, exact probes try every
    /// agent's qualified key in [`Agent::ALL`] order.
    pub agent: Option<Agent>,
    /// Querying user, for the private-cache tier.
    pub user_id: Option<&'a str>,
    /// Pre-computed query embedding, for the semantic tier.
    pub embedding: Option<&'a [f32]>,
}

/// Optional parameters for [`ResponseCache::set`].
#[derive(Debug, Clone, Default)]
pub struct CacheWrite<'a> {
    /// Owning user; when set, the entry goes to that user's private cache.
    pub user_id: Option<&'a str>,
    /// Query embedding stored for later semantic matching.
    pub embedding: Option<Vec<f32>>,
    /// Explicit TTL override. Takes precedence over the pattern table.
    pub ttl: Option<Duration>,
    /// Latency/token bookkeeping from the original answer.
    pub metadata: Option<ResponseMetadata>,
}

/// A cache hit: the stored response and the agent that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnswer {
    pub response: String,
    pub agent: Agent,
}

/// Bulk-insert entry for [`ResponseCache::warm`].
#[derive(Debug, Clone)]
pub struct WarmEntry {
    pub query: String,
    pub response: String,
    pub agent: Agent,
}

/// Scope selector for [`ResponseCache::invalidate`].
#[derive(Debug, Clone)]
pub enum Invalidation {
    /// Clear the global cache and every user's private cache.
    All,
    /// Clear one user's private cache only.
    User(String),
    /// Remove global entries keyed under one agent only.
    Agent(Agent),
}

/// Running hit/miss statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries in the global cache (user caches not included).
    pub size: usize,
    pub hit_rate: f64,
    /// Running average of recorded latency saved by hits, in milliseconds.
    pub avg_latency_saved_ms: f64,
}

struct CacheEntry {
    #[allow(dead_code)] // kept for invalidation debugging and future listing
    query: String,
    embedding: Option<Vec<f32>>,
    response: String,
    agent: Agent,
    created_at: Instant,
    ttl: Duration,
    hits: u64,
    metadata: Option<ResponseMetadata>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

#[derive(Default)]
struct CacheState {
    global: HashMap<String, CacheEntry>,
    users: HashMap<String, HashMap<String, CacheEntry>>,
    hits: u64,
    misses: u64,
    latency_saved_total_ms: u64,
    latency_samples: u64,
}

/// In-memory response cache with exact, per-user, and semantic matching.
///
/// All methods take `&self`; state lives behind a mutex. No operation
/// suspends or fails.
pub struct ResponseCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            config: config.clone(),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Look up a cached answer for `query`.
    ///
    /// Tier order: exact global, exact per-user, semantic. Every hit bumps
    /// the entry's hit counter and the running statistics.
    pub fn get(&self, query: &str, lookup: &CacheLookup<'_>) -> Option<CachedAnswer> {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return None;
        }
        let now = Instant::now();
        let mut state = self.lock();

        // (a) Exact match in the global cache.
        if let Some(key) = find_exact(&state.global, &normalized, lookup.agent, now) {
            return Some(record_hit(&mut state, Location::Global(key), "exact"));
        }

        // (b) Exact match in the user's private cache.
        if let Some(user_id) = lookup.user_id
            && let Some(user_map) = state.users.get(user_id)
            && let Some(key) = find_exact(user_map, &normalized, lookup.agent, now)
        {
            let location = Location::User(user_id.to_string(), key);
            return Some(record_hit(&mut state, location, "user"));
        }

        // (c) Semantic match over unexpired global entries.
        if self.config.semantic_matching
            && let Some(embedding) = lookup.embedding
            && let Some(key) = self.find_semantic(&state, embedding, now)
        {
            return Some(record_hit(&mut state, Location::Global(key), "semantic"));
        }

        state.misses += 1;
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        debug!(query = %normalized, "response cache miss");
        None
    }

    /// Store an agent answer.
    ///
    /// TTL resolution: explicit override, then the common-query pattern
    /// table, then the configured default. Inserting a new global key at
    /// capacity evicts exactly one entry first.
    pub fn set(&self, query: &str, response: &str, agent: Agent, write: &CacheWrite<'_>) {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return;
        }
        let ttl = write
            .ttl
            .or_else(|| common_query_ttl(&normalized))
            .unwrap_or(self.config.default_ttl);
        let entry = CacheEntry {
            query: normalized.clone(),
            embedding: write.embedding.clone(),
            response: response.to_string(),
            agent,
            created_at: Instant::now(),
            ttl,
            hits: 0,
            metadata: write.metadata,
        };
        let key = qualified_key(agent, &normalized);
        let mut state = self.lock();

        match write.user_id {
            Some(user_id) => {
                // Private entries are exempt from the capacity cap (see
                // module docs).
                state
                    .users
                    .entry(user_id.to_string())
                    .or_default()
                    .insert(key, entry);
            }
            None => {
                if !state.global.contains_key(&key) && state.global.len() >= self.config.max_entries
                {
                    evict_one(&mut state.global);
                }
                state.global.insert(key, entry);
            }
        }
    }

    /// Remove cached entries in the given scope.
    pub fn invalidate(&self, scope: Invalidation) {
        let mut state = self.lock();
        match scope {
            Invalidation::All => {
                state.global.clear();
                state.users.clear();
            }
            Invalidation::User(user_id) => {
                state.users.remove(&user_id);
            }
            Invalidation::Agent(agent) => {
                let prefix = format!("{}::", agent.as_str());
                state.global.retain(|key, _| !key.starts_with(&prefix));
            }
        }
    }

    /// Bulk-insert answers with a fixed one-hour TTL, bypassing the
    /// common-query pattern table.
    pub fn warm(&self, entries: Vec<WarmEntry>) {
        for entry in entries {
            self.set(
                &entry.query,
                &entry.response,
                entry.agent,
                &CacheWrite {
                    ttl: Some(WARM_TTL),
                    ..CacheWrite::default()
                },
            );
        }
    }

    /// Snapshot of the running statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            size: state.global.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
            avg_latency_saved_ms: if state.latency_samples == 0 {
                0.0
            } else {
                state.latency_saved_total_ms as f64 / state.latency_samples as f64
            },
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().expect("response cache lock poisoned")
    }

    /// Best-scoring unexpired global entry strictly above the threshold.
    fn find_semantic(&self, state: &CacheState, embedding: &[f32], now: Instant) -> Option<String> {
        let mut best: Option<(&String, f32)> = None;
        for (key, entry) in &state.global {
            if entry.is_expired(now) {
                continue;
            }
            let Some(stored) = &entry.embedding else {
                continue;
            };
            let score = cosine_similarity(embedding, stored);
            if score > self.config.similarity_threshold
                && best.is_none_or(|(_, best_score)| score > best_score)
            {
                best = Some((key, score));
            }
        }
        best.map(|(key, _)| key.clone())
    }
}

/// Where a hit was found, so bookkeeping can re-borrow the entry mutably.
enum Location {
    Global(String),
    User(String, String),
}

fn record_hit(state: &mut CacheState, location: Location, kind: &'static str) -> CachedAnswer {
    let entry = match &location {
        Location::Global(key) => state.global.get_mut(key),
        Location::User(user_id, key) => state
            .users
            .get_mut(user_id)
            .and_then(|map| map.get_mut(key)),
    }
    .expect("hit location resolved under the same lock");

    entry.hits += 1;
    let answer = CachedAnswer {
        response: entry.response.clone(),
        agent: entry.agent,
    };
    if let Some(metadata) = entry.metadata {
        state.latency_saved_total_ms += metadata.latency_ms;
        state.latency_samples += 1;
    }
    state.hits += 1;
    metrics::counter!(telemetry::CACHE_HITS_TOTAL, "match" => kind).increment(1);
    answer
}

/// Exact probe: the given agent's qualified key, or every agent's in
/// declaration order when no agent was supplied. Expired entries are
/// skipped, not removed.
fn find_exact(
    map: &HashMap<String, CacheEntry>,
    normalized: &str,
    agent: Option<Agent>,
    now: Instant,
) -> Option<String> {
    let candidates: &[Agent] = match agent {
        Some(agent) => &[agent],
        None => &Agent::ALL,
    };
    for candidate in candidates {
        let key = qualified_key(*candidate, normalized);
        if let Some(entry) = map.get(&key)
            && !entry.is_expired(now)
        {
            return Some(key);
        }
    }
    None
}

/// Evict exactly one entry: the first expired one found, otherwise the
/// entry with the fewest hits, ties broken by oldest creation time.
fn evict_one(global: &mut HashMap<String, CacheEntry>) {
    let now = Instant::now();
    if let Some(key) = global
        .iter()
        .find(|(_, entry)| entry.is_expired(now))
        .map(|(key, _)| key.clone())
    {
        global.remove(&key);
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "kind" => "expired").increment(1);
        return;
    }
    if let Some(key) = global
        .iter()
        .min_by_key(|(_, entry)| (entry.hits, entry.created_at))
        .map(|(key, _)| key.clone())
    {
        global.remove(&key);
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "kind" => "cold").increment(1);
    }
}

/// Lowercase, trim, collapse internal whitespace.
fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Agent-qualified cache key, so the same text routed to two agents never
/// collides.
fn qualified_key(agent: Agent, normalized: &str) -> String {
    format!("{}::{}", agent.as_str(), normalized)
}

/// TTL from the common-query pattern table, if any pattern matches.
fn common_query_ttl(normalized: &str) -> Option<Duration> {
    COMMON_QUERY_TTLS
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| contains_phrase(normalized, p)))
        .map(|(_, ttl)| *ttl)
}
