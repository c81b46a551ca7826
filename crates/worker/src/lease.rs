//! Expiring per-key leases used as the job overlap guard.
//!
//! A lease is taken when a job is enqueued and normally handed back when the
//! job succeeds. If the job fails, or the worker dies mid-job, the lease simply
//! runs out after its lifetime and the key becomes usable again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use repairdesk_core::clock::Clock;

pub struct LeaseTable {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    leases: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl LeaseTable {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Takes the lease on `key` unless someone else holds an unexpired one.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut leases = self.lock();
        leases.retain(|_, expires_at| *expires_at > now);

        if leases.contains_key(key) {
            return false;
        }
        leases.insert(key.to_string(), now + self.ttl);
        true
    }

    pub fn release(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn is_held(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .is_some_and(|expires_at| *expires_at > now)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.leases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
