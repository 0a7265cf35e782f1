//! Time-bounded duplicate suppression.
//!
//! The same channel event can reach the engine through more than one
//! delivery path within a short interval. The window tracks fingerprints of
//! recently admitted events and suppresses repeats until the entry expires.
//!
//! Expiration is lazy: stale entries are evicted at the next admission, so
//! the window needs no timers or background tasks and can be dropped at any
//! time without cleanup.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Identity triple for duplicate detection.
///
/// Deliberately excludes timestamps and delivery metadata so retransmissions
/// of the same content collapse onto one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    source: String,
    author: String,
    text: String,
}

impl Fingerprint {
    pub fn new(source: &str, author: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            author: author.to_string(),
            text: text.to_string(),
        }
    }
}

/// Sliding window of recently admitted fingerprints.
///
/// The TTL is constant, so insertion order is expiry order: the queue front
/// is always the next entry to expire, and eviction never scans past a live
/// entry.
#[derive(Debug)]
pub struct DedupWindow {
    ttl: Duration,
    inner: Mutex<WindowInner>,
}

#[derive(Debug, Default)]
struct WindowInner {
    /// Fingerprint to the deadline of the admission that inserted it.
    entries: HashMap<Fingerprint, Instant>,
    /// Expiry-ordered queue; front expires first.
    queue: VecDeque<(Instant, Fingerprint)>,
}

impl DedupWindow {
    /// Create a window with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(WindowInner::default()),
        }
    }

    /// Admit or suppress a fingerprint.
    ///
    /// Returns `true` when the fingerprint was not being tracked; it is then
    /// inserted with the window TTL. Returns `false` for a tracked
    /// fingerprint. Suppression does not refresh the entry's deadline, so
    /// the same content becomes admissible again one TTL after its first
    /// admission regardless of how many repeats arrived in between.
    pub fn admit(&self, fingerprint: Fingerprint) -> bool {
        self.admit_at(fingerprint, Instant::now())
    }

    /// Number of fingerprints currently tracked (including not-yet-evicted
    /// expired entries).
    pub fn tracked(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Drop all tracked fingerprints.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.queue.clear();
    }

    fn admit_at(&self, fingerprint: Fingerprint, now: Instant) -> bool {
        let mut inner = self.inner.lock();

        // Evict everything whose deadline has passed. A queue node and its
        // map entry are inserted together with equal deadlines; the map
        // value is authoritative, so an entry is only removed while the
        // deadlines still agree.
        while inner.queue.front().is_some_and(|(deadline, _)| *deadline <= now) {
            if let Some((deadline, fp)) = inner.queue.pop_front() {
                if inner.entries.get(&fp) == Some(&deadline) {
                    inner.entries.remove(&fp);
                }
            }
        }

        if inner.entries.contains_key(&fingerprint) {
            return false;
        }

        let deadline = now + self.ttl;
        inner.entries.insert(fingerprint.clone(), deadline);
        inner.queue.push_back((deadline, fingerprint));
        true
    }
}
