//! Per-node minimum-interval gate.
//!
//! Every node id gets one [`RateLimiterEntry`]. Callers reserve the next
//! dispatch slot for a node under the registry lock and then sleep until
//! that slot, so concurrent callers queue behind each other instead of all
//! waking up at the same instant.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default minimum interval between two calls to the same node.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default number of nodes tracked before the least recently used is evicted.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Diagnostic snapshot of one node's limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterEntry {
    pub node_id: String,
    /// Dispatch time of the most recently reserved call.
    pub last_call: Option<Instant>,
    pub min_interval: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    last_call: Option<Instant>,
    min_interval: Duration,
}

impl Slot {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_call: None,
            min_interval,
        }
    }

    /// Reserve the earliest slot at or after `now` and return the wait.
    fn reserve(&mut self, now: Instant) -> Duration {
        let slot = match self.last_call {
            Some(last) => (last + self.min_interval).max(now),
            None => now,
        };
        self.last_call = Some(slot);
        slot.saturating_duration_since(now)
    }
}

/// Table of per-node limiters shared by every node handle of a client.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use nodewatch_sdk::RateLimiterRegistry;
///
/// let registry = RateLimiterRegistry::new(Duration::from_millis(100));
/// assert_eq!(registry.acquire("node-a"), Duration::ZERO);
/// assert!(registry.acquire("node-a") > Duration::ZERO);
/// assert_eq!(registry.acquire("node-b"), Duration::ZERO);
/// ```
#[derive(Debug)]
pub struct RateLimiterRegistry {
    default_interval: Duration,
    entries: Mutex<LruCache<String, Slot>>,
}

impl RateLimiterRegistry {
    /// Create a registry with the default capacity.
    pub fn new(default_interval: Duration) -> Self {
        Self::with_capacity(default_interval, DEFAULT_CAPACITY)
    }

    /// Create a registry that tracks at most `capacity` nodes.
    pub fn with_capacity(default_interval: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            default_interval,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Interval given to nodes without an override.
    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Maximum number of tracked nodes.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no node is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Override the interval for one node.
    pub fn set_interval(&self, node_id: &str, interval: Duration) {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.get_mut(node_id) {
            slot.min_interval = interval;
            return;
        }
        Self::insert(&mut entries, node_id, Slot::new(interval));
    }

    /// Snapshot of a node's limiter without touching its recency.
    pub fn entry(&self, node_id: &str) -> Option<RateLimiterEntry> {
        self.entries.lock().peek(node_id).map(|slot| RateLimiterEntry {
            node_id: node_id.to_string(),
            last_call: slot.last_call,
            min_interval: slot.min_interval,
        })
    }

    /// Reserve the next dispatch slot for `node_id`.
    ///
    /// Returns how long the caller must wait before dispatching. The slot is
    /// recorded immediately, so a second caller gets the slot after it.
    pub fn acquire(&self, node_id: &str) -> Duration {
        self.acquire_at(node_id, Instant::now())
    }

    pub(crate) fn acquire_at(&self, node_id: &str, now: Instant) -> Duration {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.get_mut(node_id) {
            return slot.reserve(now);
        }

        let mut slot = Slot::new(self.default_interval);
        let delay = slot.reserve(now);
        Self::insert(&mut entries, node_id, slot);
        delay
    }

    /// Reserve a slot and sleep until it.
    pub async fn wait(&self, node_id: &str) {
        let delay = self.acquire(node_id);
        if delay.is_zero() {
            return;
        }
        warn!(
            node_id,
            wait_ms = delay.as_millis() as u64,
            "Rate limited, delaying call"
        );
        tokio::time::sleep(delay).await;
    }

    fn insert(entries: &mut LruCache<String, Slot>, node_id: &str, slot: Slot) {
        if let Some((evicted, _)) = entries.push(node_id.to_string(), slot) {
            debug!(node_id = %evicted, "Evicted rate limiter entry");
        }
    }
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}
