//! Tests for [`ResponseCache`] — exact / per-user / semantic matching,
//! TTL resolution, and the hit-count/age hybrid eviction policy.

use std::time::Duration;

use muninn::{
    Agent, CacheConfig, CacheLookup, CacheWrite, Invalidation, ResponseCache, ResponseMetadata,
    WarmEntry,
};

fn write_for_user(user_id: &str) -> CacheWrite<'_> {
    CacheWrite {
        user_id: Some(user_id),
        ..CacheWrite::default()
    }
}

fn lookup_for(agent: Agent) -> CacheLookup<'static> {
    CacheLookup {
        agent: Some(agent),
        ..CacheLookup::default()
    }
}

// =========================================================================
// CacheConfig
// =========================================================================

#[test]
fn cache_config_defaults() {
    let config = CacheConfig::default();
    assert_eq!(config.max_entries, 1_000);
    assert_eq!(config.default_ttl, Duration::from_secs(300));
    assert!(config.semantic_matching);
}

#[test]
fn cache_config_builder() {
    let config = CacheConfig::new()
        .max_entries(50)
        .default_ttl(Duration::from_secs(60))
        .similarity_threshold(0.9)
        .semantic_matching(false);
    assert_eq!(config.max_entries, 50);
    assert_eq!(config.similarity_threshold, 0.9);
    assert!(!config.semantic_matching);
}

// =========================================================================
// Exact matching
// =========================================================================

#[tokio::test]
async fn set_then_get_round_trip() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set(
        "explain borrow checking",
        "it prevents aliased mutation",
        Agent::Coder,
        &CacheWrite::default(),
    );

    let hit = cache.get("explain borrow checking", &lookup_for(Agent::Coder));
    assert_eq!(hit.unwrap().response, "it prevents aliased mutation");
}

#[tokio::test]
async fn key_normalization_ignores_case_and_whitespace() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set("What Time Is It", "noon", Agent::Secretary, &CacheWrite::default());

    let hit = cache.get("  what   time is it ", &lookup_for(Agent::Secretary));
    assert!(hit.is_some());
}

#[tokio::test]
async fn same_query_different_agents_never_collide() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set("status", "all tests green", Agent::Coder, &CacheWrite::default());
    cache.set("status", "inbox zero", Agent::Secretary, &CacheWrite::default());

    assert_eq!(
        cache.get("status", &lookup_for(Agent::Coder)).unwrap().response,
        "all tests green"
    );
    assert_eq!(
        cache.get("status", &lookup_for(Agent::Secretary)).unwrap().response,
        "inbox zero"
    );
}

#[tokio::test]
async fn agentless_lookup_probes_all_agents() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set("status", "all tests green", Agent::Coder, &CacheWrite::default());

    let hit = cache.get("status", &CacheLookup::default()).unwrap();
    assert_eq!(hit.agent, Agent::Coder);
}

#[tokio::test]
async fn empty_query_is_a_miss() {
    let cache = ResponseCache::new(&CacheConfig::default());
    assert!(cache.get("   ", &CacheLookup::default()).is_none());
}

// =========================================================================
// TTL resolution and expiry (paused tokio clock)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn entry_expires_at_its_ttl_boundary() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set(
        "summarize the meeting",
        "three action items",
        Agent::Secretary,
        &CacheWrite {
            ttl: Some(Duration::from_millis(100)),
            ..CacheWrite::default()
        },
    );

    tokio::time::advance(Duration::from_millis(99)).await;
    assert!(cache.get("summarize the meeting", &lookup_for(Agent::Secretary)).is_some());

    tokio::time::advance(Duration::from_millis(2)).await;
    assert!(cache.get("summarize the meeting", &lookup_for(Agent::Secretary)).is_none());
}

#[tokio::test(start_paused = true)]
async fn greeting_uses_pattern_ttl_not_the_default() {
    // A huge default makes the short pattern TTL observable.
    let config = CacheConfig::new().default_ttl(Duration::from_secs(24 * 3600));
    let cache = ResponseCache::new(&config);

    cache.set("Hello", "hi there!", Agent::Personality, &CacheWrite::default());

    tokio::time::advance(Duration::from_millis(59_000)).await;
    assert!(cache.get("hello", &lookup_for(Agent::Personality)).is_some());

    // Past the 60,000 ms greeting TTL, well within the default.
    tokio::time::advance(Duration::from_millis(2_000)).await;
    assert!(cache.get("hello", &lookup_for(Agent::Personality)).is_none());
}

#[tokio::test(start_paused = true)]
async fn explicit_ttl_overrides_the_pattern_table() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set(
        "hello",
        "hi!",
        Agent::Personality,
        &CacheWrite {
            ttl: Some(Duration::from_secs(600)),
            ..CacheWrite::default()
        },
    );

    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(cache.get("hello", &lookup_for(Agent::Personality)).is_some());
}

// =========================================================================
// Eviction: expired first, else fewest hits, ties by age
// =========================================================================

#[tokio::test(start_paused = true)]
async fn capacity_is_never_exceeded() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(3));

    for i in 0..10 {
        cache.set(&format!("query {i}"), "answer", Agent::Coder, &CacheWrite::default());
    }
    assert_eq!(cache.stats().size, 3);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_evicted_before_cold_ones() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));

    cache.set(
        "stale",
        "old",
        Agent::Coder,
        &CacheWrite {
            ttl: Some(Duration::from_millis(10)),
            ..CacheWrite::default()
        },
    );
    cache.set("keep", "fresh", Agent::Coder, &CacheWrite::default());

    // "keep" earns a hit; "stale" expires.
    assert!(cache.get("keep", &lookup_for(Agent::Coder)).is_some());
    tokio::time::advance(Duration::from_millis(20)).await;

    cache.set("incoming", "new", Agent::Coder, &CacheWrite::default());

    assert!(cache.get("keep", &lookup_for(Agent::Coder)).is_some());
    assert!(cache.get("incoming", &lookup_for(Agent::Coder)).is_some());
    assert!(cache.get("stale", &lookup_for(Agent::Coder)).is_none());
    assert_eq!(cache.stats().size, 2);
}

#[tokio::test(start_paused = true)]
async fn coldest_entry_is_evicted_when_none_expired() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));

    cache.set("popular", "a", Agent::Coder, &CacheWrite::default());
    cache.set("unpopular", "b", Agent::Coder, &CacheWrite::default());

    // Two hits for "popular", zero for "unpopular".
    assert!(cache.get("popular", &lookup_for(Agent::Coder)).is_some());
    assert!(cache.get("popular", &lookup_for(Agent::Coder)).is_some());

    cache.set("incoming", "c", Agent::Coder, &CacheWrite::default());

    assert!(cache.get("popular", &lookup_for(Agent::Coder)).is_some());
    assert!(cache.get("unpopular", &lookup_for(Agent::Coder)).is_none());
}

#[tokio::test(start_paused = true)]
async fn hit_count_tie_breaks_by_oldest() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));

    cache.set("older", "a", Agent::Coder, &CacheWrite::default());
    tokio::time::advance(Duration::from_millis(5)).await;
    cache.set("newer", "b", Agent::Coder, &CacheWrite::default());
    tokio::time::advance(Duration::from_millis(5)).await;

    // Both at zero hits; the older one goes.
    cache.set("incoming", "c", Agent::Coder, &CacheWrite::default());

    assert!(cache.get("older", &lookup_for(Agent::Coder)).is_none());
    assert!(cache.get("newer", &lookup_for(Agent::Coder)).is_some());
}

// =========================================================================
// Per-user caches
// =========================================================================

#[tokio::test]
async fn user_entries_are_private_to_that_user() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set("my schedule", "9am standup", Agent::Secretary, &write_for_user("alice"));

    let alice = CacheLookup {
        agent: Some(Agent::Secretary),
        user_id: Some("alice"),
        ..CacheLookup::default()
    };
    let bob = CacheLookup {
        agent: Some(Agent::Secretary),
        user_id: Some("bob"),
        ..CacheLookup::default()
    };

    assert!(cache.get("my schedule", &alice).is_some());
    assert!(cache.get("my schedule", &bob).is_none());
    // Not in the global cache either.
    assert!(cache.get("my schedule", &lookup_for(Agent::Secretary)).is_none());
}

#[tokio::test]
async fn user_caches_are_exempt_from_the_capacity_cap() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));

    for i in 0..5 {
        cache.set(&format!("note {i}"), "saved", Agent::Secretary, &write_for_user("alice"));
    }
    let alice = CacheLookup {
        agent: Some(Agent::Secretary),
        user_id: Some("alice"),
        ..CacheLookup::default()
    };
    for i in 0..5 {
        assert!(cache.get(&format!("note {i}"), &alice).is_some());
    }
}

// =========================================================================
// Semantic matching
// =========================================================================

#[tokio::test]
async fn similar_embedding_above_threshold_hits() {
    let config = CacheConfig::new().similarity_threshold(0.5);
    let cache = ResponseCache::new(&config);

    cache.set(
        "what's on my calendar today",
        "two meetings",
        Agent::Secretary,
        &CacheWrite {
            embedding: Some(vec![1.0, 0.0]),
            ..CacheWrite::default()
        },
    );

    // cos([1,0], [1,1]) ≈ 0.707 > 0.5
    let hit = cache.get(
        "any events on my schedule",
        &CacheLookup {
            embedding: Some(&[1.0, 1.0]),
            ..CacheLookup::default()
        },
    );
    assert_eq!(hit.unwrap().response, "two meetings");
}

#[tokio::test]
async fn dissimilar_embedding_misses() {
    let config = CacheConfig::new().similarity_threshold(0.5);
    let cache = ResponseCache::new(&config);

    cache.set(
        "what's on my calendar today",
        "two meetings",
        Agent::Secretary,
        &CacheWrite {
            embedding: Some(vec![1.0, 0.0]),
            ..CacheWrite::default()
        },
    );

    let hit = cache.get(
        "how do lifetimes work",
        &CacheLookup {
            embedding: Some(&[0.0, 1.0]),
            ..CacheLookup::default()
        },
    );
    assert!(hit.is_none());
}

#[tokio::test]
async fn score_equal_to_threshold_is_a_miss() {
    // A hit requires strictly above the threshold; identical vectors score
    // exactly 1.0.
    let config = CacheConfig::new().similarity_threshold(1.0);
    let cache = ResponseCache::new(&config);

    cache.set(
        "q",
        "a",
        Agent::Coder,
        &CacheWrite {
            embedding: Some(vec![0.6, 0.8]),
            ..CacheWrite::default()
        },
    );

    let hit = cache.get(
        "different wording",
        &CacheLookup {
            embedding: Some(&[0.6, 0.8]),
            ..CacheLookup::default()
        },
    );
    assert!(hit.is_none());
}

#[tokio::test]
async fn semantic_tier_disabled_by_config() {
    let config = CacheConfig::new().similarity_threshold(0.1).semantic_matching(false);
    let cache = ResponseCache::new(&config);

    cache.set(
        "q",
        "a",
        Agent::Coder,
        &CacheWrite {
            embedding: Some(vec![1.0, 0.0]),
            ..CacheWrite::default()
        },
    );

    let hit = cache.get(
        "rephrased q",
        &CacheLookup {
            embedding: Some(&[1.0, 0.0]),
            ..CacheLookup::default()
        },
    );
    assert!(hit.is_none());
}

#[tokio::test]
async fn best_scoring_semantic_candidate_wins() {
    let config = CacheConfig::new().similarity_threshold(0.1);
    let cache = ResponseCache::new(&config);

    let near = CacheWrite {
        embedding: Some(vec![0.9, 0.1]),
        ..CacheWrite::default()
    };
    let far = CacheWrite {
        embedding: Some(vec![0.5, 0.5]),
        ..CacheWrite::default()
    };
    cache.set("close match", "near answer", Agent::Coder, &near);
    cache.set("loose match", "far answer", Agent::Coder, &far);

    let hit = cache.get(
        "novel phrasing",
        &CacheLookup {
            embedding: Some(&[1.0, 0.0]),
            ..CacheLookup::default()
        },
    );
    assert_eq!(hit.unwrap().response, "near answer");
}

// =========================================================================
// Invalidation
// =========================================================================

#[tokio::test]
async fn invalidate_all_empties_every_cache() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.set("global q", "a", Agent::Coder, &CacheWrite::default());
    cache.set("user q", "b", Agent::Coder, &write_for_user("alice"));

    cache.invalidate(Invalidation::All);

    assert!(cache.get("global q", &lookup_for(Agent::Coder)).is_none());
    let alice = CacheLookup {
        agent: Some(Agent::Coder),
        user_id: Some("alice"),
        ..CacheLookup::default()
    };
    assert!(cache.get("user q", &alice).is_none());
    assert_eq!(cache.stats().size, 0);
}

#[tokio::test]
async fn invalidate_agent_leaves_other_agents_intact() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.set("q1", "a", Agent::Coder, &CacheWrite::default());
    cache.set("q2", "b", Agent::Finance, &CacheWrite::default());

    cache.invalidate(Invalidation::Agent(Agent::Coder));

    assert!(cache.get("q1", &lookup_for(Agent::Coder)).is_none());
    assert!(cache.get("q2", &lookup_for(Agent::Finance)).is_some());
}

#[tokio::test]
async fn invalidate_user_clears_only_that_user() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.set("q", "a", Agent::Coder, &write_for_user("alice"));
    cache.set("q", "b", Agent::Coder, &write_for_user("bob"));

    cache.invalidate(Invalidation::User("alice".into()));

    let alice = CacheLookup {
        agent: Some(Agent::Coder),
        user_id: Some("alice"),
        ..CacheLookup::default()
    };
    let bob = CacheLookup {
        agent: Some(Agent::Coder),
        user_id: Some("bob"),
        ..CacheLookup::default()
    };
    assert!(cache.get("q", &alice).is_none());
    assert!(cache.get("q", &bob).is_some());
}

// =========================================================================
// Stats and warming
// =========================================================================

#[tokio::test]
async fn stats_track_hits_misses_and_latency_saved() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.set(
        "q",
        "a",
        Agent::Coder,
        &CacheWrite {
            metadata: Some(ResponseMetadata {
                latency_ms: 800,
                tokens: Some(120),
            }),
            ..CacheWrite::default()
        },
    );

    assert!(cache.get("q", &lookup_for(Agent::Coder)).is_some());
    assert!(cache.get("missing", &lookup_for(Agent::Coder)).is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 0.5);
    assert_eq!(stats.avg_latency_saved_ms, 800.0);
}

#[tokio::test(start_paused = true)]
async fn warm_entries_get_a_one_hour_ttl() {
    let cache = ResponseCache::new(&CacheConfig::default());

    cache.warm(vec![WarmEntry {
        // Would normally hit the 60 s greeting pattern; warming bypasses it.
        query: "hello".into(),
        response: "hi there!".into(),
        agent: Agent::Personality,
    }]);

    tokio::time::advance(Duration::from_secs(59 * 60)).await;
    assert!(cache.get("hello", &lookup_for(Agent::Personality)).is_some());

    tokio::time::advance(Duration::from_secs(2 * 60)).await;
    assert!(cache.get("hello", &lookup_for(Agent::Personality)).is_none());
}

// =========================================================================
// Metrics
// =========================================================================

#[test]
fn hit_and_miss_counters_are_emitted() {
    use metrics_util::MetricKind;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let cache = ResponseCache::new(&CacheConfig::default());
        cache.get("q", &CacheLookup::default());
        cache.set("q", "a", Agent::Coder, &CacheWrite::default());
        cache.get("q", &lookup_for(Agent::Coder));
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let counter_sum = |name: &str| -> u64 {
        snapshot
            .iter()
            .filter(|(key, _, _, _)| {
                key.kind() == MetricKind::Counter && key.key().name() == name
            })
            .map(|(_, _, _, val)| match val {
                DebugValue::Counter(c) => *c,
                _ => 0,
            })
            .sum()
    };

    assert_eq!(counter_sum("muninn_cache_misses_total"), 1);
    assert_eq!(counter_sum("muninn_cache_hits_total"), 1);
}
