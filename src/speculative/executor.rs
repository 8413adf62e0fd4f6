//! Background prefetch of predicted tool calls.
//!
//! # Concurrency contract
//!
//! Up to [`MAX_TOOLS_PER_DECISION`] tools run concurrently per routing
//! decision. The pending-membership check and insert happen under a single
//! lock guard, so duplicate requests for the same `(tool, args)` while one
//! is pending or cached never start duplicate underlying work — including
//! under true parallel execution. Expired results are purged lazily, once
//! per user, at the start of each [`SpeculativeExecutor::start`] call; there
//! is no periodic sweep.
//!
//! # Cancellation
//!
//! [`CancellationHandle::cancel`] sets a flag that each spawned call checks
//! when its result lands. A result arriving after cancellation is dropped
//! and logged at debug level; work already in flight is never aborted.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::telemetry;
use crate::traits::ToolExecutor;
use crate::types::{
    Agent, PlannedCall, RoutingDecision, SpeculativeCoverage, SpeculativeResult, SpeculativeStats,
};

/// How many plan entries run per routing decision, highest priority first.
pub const MAX_TOOLS_PER_DECISION: usize = 3;

/// Validity window of a completed speculative result.
pub const RESULT_TTL: Duration = Duration::from_secs(30);

/// Default bound for [`SpeculativeExecutor::wait`].
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for the speculative executor.
#[derive(Debug, Clone)]
pub struct SpeculativeConfig {
    /// Plan entries executed per routing decision.
    /// Default: [`MAX_TOOLS_PER_DECISION`].
    pub max_tools_per_decision: usize,
    /// Validity window of completed results. Default: [`RESULT_TTL`].
    pub result_ttl: Duration,
    /// Default bound for `wait`. Default: [`WAIT_TIMEOUT`].
    pub wait_timeout: Duration,
}

impl Default for SpeculativeConfig {
    fn default() -> Self {
        Self {
            max_tools_per_decision: MAX_TOOLS_PER_DECISION,
            result_ttl: RESULT_TTL,
            wait_timeout: WAIT_TIMEOUT,
        }
    }
}

impl SpeculativeConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-decision tool cap.
    pub fn max_tools_per_decision(mut self, n: usize) -> Self {
        self.max_tools_per_decision = n;
        self
    }

    /// Set the result validity window.
    pub fn result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    /// Set the default wait bound.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// The static per-agent prefetch table.
///
/// Priorities express how likely the tool is to be needed in that agent's
/// first response. `Personality` has no entry: the fallback agent's
/// responses rarely need tools, so prefetching would be waste.
pub fn default_plans() -> HashMap<Agent, Vec<PlannedCall>> {
    let mut plans = HashMap::new();
    plans.insert(
        Agent::Home,
        vec![
            PlannedCall::new("get_device_states", json!({}), 3),
            PlannedCall::new("get_active_scenes", json!({}), 2),
            PlannedCall::new("get_climate_state", json!({}), 1),
        ],
    );
    plans.insert(
        Agent::Secretary,
        vec![
            PlannedCall::new("get_upcoming_events", json!({ "days": 7 }), 3),
            PlannedCall::new("get_recent_notes", json!({ "limit": 10 }), 2),
            PlannedCall::new("get_reminders", json!({}), 1),
        ],
    );
    plans.insert(
        Agent::Finance,
        vec![
            PlannedCall::new("get_account_summary", json!({}), 3),
            PlannedCall::new("get_recent_transactions", json!({ "limit": 20 }), 2),
            PlannedCall::new("get_budget_status", json!({}), 1),
        ],
    );
    plans.insert(
        Agent::Researcher,
        vec![
            PlannedCall::new("get_saved_searches", json!({}), 2),
            PlannedCall::new("get_reading_list", json!({ "limit": 10 }), 1),
        ],
    );
    plans.insert(
        Agent::Coder,
        vec![
            PlannedCall::new("get_active_repos", json!({}), 2),
            PlannedCall::new("get_open_issues", json!({ "limit": 10 }), 1),
        ],
    );
    plans
}

/// Handle returned by [`SpeculativeExecutor::start`].
///
/// Cancellation is cooperative: results of this turn's prefetches that land
/// after `cancel()` are dropped instead of cached.
#[derive(Clone)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark this turn's prefetches as no longer wanted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether `cancel()` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct UserState {
    results: HashMap<u64, SpeculativeResult>,
    /// In-flight calls. The receiver resolves (value or closed) when the
    /// call's bookkeeping is done, so waiters can re-check `results`.
    pending: HashMap<u64, watch::Receiver<()>>,
}

/// Launches predicted tool calls ahead of demand and caches their results
/// for a short window, deduplicating in-flight work per user.
pub struct SpeculativeExecutor {
    tools: Arc<dyn ToolExecutor>,
    plans: HashMap<Agent, Vec<PlannedCall>>,
    config: SpeculativeConfig,
    users: Arc<Mutex<HashMap<String, UserState>>>,
}

impl SpeculativeExecutor {
    /// Create an executor over the given tool capability and plan table.
    pub fn new(
        tools: Arc<dyn ToolExecutor>,
        config: SpeculativeConfig,
        plans: HashMap<Agent, Vec<PlannedCall>>,
    ) -> Self {
        Self {
            tools,
            plans,
            config,
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Begin background prefetch for a routing decision.
    ///
    /// Selects up to `max_tools_per_decision` plan entries by descending
    /// priority and launches each one that is neither validly cached nor
    /// already pending for this user. Tool failures are logged and dropped,
    /// never surfaced. Agents without a plan trigger nothing.
    pub fn start(&self, decision: &RoutingDecision, user_id: &str) -> CancellationHandle {
        let handle = CancellationHandle::new();
        let Some(plan) = self.plans.get(&decision.agent) else {
            return handle;
        };

        let mut candidates: Vec<&PlannedCall> = plan.iter().collect();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        candidates.truncate(self.config.max_tools_per_decision);

        let now = Instant::now();
        let result_ttl = self.config.result_ttl;
        let mut users = self.lock();
        let state = users.entry(user_id.to_string()).or_default();
        // Lazy purge: once per user, at the start of each prefetch request.
        state
            .results
            .retain(|_, r| now.duration_since(r.completed_at) < result_ttl);

        for call in candidates {
            let key = speculative_key(&call.tool, &call.args);
            if state.results.contains_key(&key) || state.pending.contains_key(&key) {
                continue;
            }
            let (tx, rx) = watch::channel(());
            state.pending.insert(key, rx);
            metrics::counter!(
                telemetry::SPECULATIVE_LAUNCHES_TOTAL,
                "agent" => decision.agent.as_str(),
                "tool" => call.tool.clone(),
            )
            .increment(1);
            self.spawn_call(decision.agent, call.clone(), key, user_id, &handle, tx);
        }
        handle
    }

    fn spawn_call(
        &self,
        agent: Agent,
        call: PlannedCall,
        key: u64,
        user_id: &str,
        handle: &CancellationHandle,
        tx: watch::Sender<()>,
    ) {
        let tools = Arc::clone(&self.tools);
        let users = Arc::clone(&self.users);
        let cancelled = Arc::clone(&handle.cancelled);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            let outcome = tools.execute(agent, &call.tool, &call.args, &user_id).await;
            {
                let mut users = users.lock().expect("speculative state lock poisoned");
                // The user's state may have been cleared while we ran.
                if let Some(state) = users.get_mut(&user_id) {
                    state.pending.remove(&key);
                    if cancelled.load(Ordering::Relaxed) {
                        debug!(tool = %call.tool, user = %user_id, "dropping cancelled speculative result");
                        metrics::counter!(telemetry::SPECULATIVE_CANCELLED_TOTAL).increment(1);
                    } else {
                        match outcome {
                            Ok(o) if o.success => {
                                state.results.insert(
                                    key,
                                    SpeculativeResult {
                                        tool: call.tool.clone(),
                                        args: call.args.clone(),
                                        data: o.data,
                                        completed_at: Instant::now(),
                                    },
                                );
                            }
                            Ok(o) => {
                                warn!(
                                    tool = %call.tool,
                                    message = o.message.as_deref().unwrap_or("unspecified"),
                                    "speculative tool reported failure"
                                );
                            }
                            Err(e) => {
                                warn!(tool = %call.tool, error = %e, "speculative tool call failed");
                            }
                        }
                    }
                }
            }
            // Wake waiters after the bookkeeping is visible.
            let _ = tx.send(());
        });
    }

    /// A cached result for `(tool, args)`, if present and still valid.
    /// Never suspends.
    pub fn get(&self, user_id: &str, tool: &str, args: &Value) -> Option<SpeculativeResult> {
        let result = self.cached(user_id, tool, args);
        self.record_lookup(tool, result.is_some());
        result
    }

    /// A cached result, waiting briefly for an in-flight call if needed.
    ///
    /// Returns a valid cached result immediately; otherwise, if this exact
    /// key is pending, races its completion against `timeout` (default
    /// [`WAIT_TIMEOUT`]); otherwise returns `None` without waiting.
    pub async fn wait(
        &self,
        user_id: &str,
        tool: &str,
        args: &Value,
        timeout: Option<Duration>,
    ) -> Option<SpeculativeResult> {
        let key = speculative_key(tool, args);
        // One critical section for both checks, so a call completing
        // in between cannot slip past us.
        let pending_rx = {
            let users = self.lock();
            if let Some(result) = lookup_valid(&users, user_id, key, self.config.result_ttl) {
                drop(users);
                self.record_lookup(tool, true);
                return Some(result);
            }
            users
                .get(user_id)
                .and_then(|state| state.pending.get(&key).cloned())
        };

        let Some(mut rx) = pending_rx else {
            self.record_lookup(tool, false);
            return None;
        };

        let bound = timeout.unwrap_or(self.config.wait_timeout);
        // Err from changed() means the sender is gone — the call finished
        // (or the user state was cleared); either way, re-check the cache.
        let _ = tokio::time::timeout(bound, rx.changed()).await;

        let result = self.cached(user_id, tool, args);
        self.record_lookup(tool, result.is_some());
        result
    }

    /// Diagnostic over a prospective tool plan: how many of its calls the
    /// speculative cache could answer right now.
    pub fn coverage(&self, user_id: &str, plan: &[(String, Value)]) -> SpeculativeCoverage {
        let users = self.lock();
        let hits = plan
            .iter()
            .filter(|(tool, args)| {
                let key = speculative_key(tool, args);
                lookup_valid(&users, user_id, key, self.config.result_ttl).is_some()
            })
            .count();
        let total = plan.len();
        SpeculativeCoverage {
            hits,
            total,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }

    /// Drop all cached and pending state for a user.
    pub fn clear_user(&self, user_id: &str) {
        self.lock().remove(user_id);
    }

    /// Administrative snapshot across all users.
    pub fn stats(&self) -> SpeculativeStats {
        let users = self.lock();
        SpeculativeStats {
            users: users.len(),
            cached_results: users.values().map(|s| s.results.len()).sum(),
            pending: users.values().map(|s| s.pending.len()).sum(),
        }
    }

    fn cached(&self, user_id: &str, tool: &str, args: &Value) -> Option<SpeculativeResult> {
        let key = speculative_key(tool, args);
        let users = self.lock();
        lookup_valid(&users, user_id, key, self.config.result_ttl)
    }

    fn record_lookup(&self, tool: &str, hit: bool) {
        if hit {
            metrics::counter!(telemetry::SPECULATIVE_HITS_TOTAL, "tool" => tool.to_owned())
                .increment(1);
        } else {
            metrics::counter!(telemetry::SPECULATIVE_MISSES_TOTAL, "tool" => tool.to_owned())
                .increment(1);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserState>> {
        self.users.lock().expect("speculative state lock poisoned")
    }
}

fn lookup_valid(
    users: &HashMap<String, UserState>,
    user_id: &str,
    key: u64,
    ttl: Duration,
) -> Option<SpeculativeResult> {
    let result = users.get(user_id)?.results.get(&key)?;
    if Instant::now().duration_since(result.completed_at) < ttl {
        Some(result.clone())
    } else {
        None
    }
}

/// Deterministic composite key over tool name and argument set.
///
/// Arguments are canonicalized (object keys recursively sorted) before
/// hashing, so non-deterministic argument ordering never causes false
/// misses. `DefaultHasher` (SipHash) is deterministic within a process
/// lifetime, which is all an in-memory cache needs.
fn speculative_key(tool: &str, args: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    tool.hash(&mut hasher);
    let mut canonical = String::new();
    canonical_json(args, &mut canonical);
    canonical.hash(&mut hasher);
    hasher.finish()
}

/// Compact serialization with object keys in sorted order, recursively.
fn canonical_json(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                canonical_json(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonical_json(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
