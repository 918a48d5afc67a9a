use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// At most one in-flight operation per key.
///
/// `try_acquire` hands out a guard that releases the key on drop, including
/// when the owning future is dropped mid-flight.
pub struct SingleFlight<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> SingleFlight<K> {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn try_acquire(&self, key: K) -> Option<FlightGuard<K>> {
        if lock(&self.active).insert(key.clone()) {
            Some(FlightGuard {
                active: Arc::clone(&self.active),
                key,
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, key: &K) -> bool {
        lock(&self.active).contains(key)
    }

    pub fn any_active(&self) -> bool {
        !lock(&self.active).is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for SingleFlight<K> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FlightGuard<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for FlightGuard<K> {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
    }
}

fn lock<K>(set: &Mutex<HashSet<K>>) -> MutexGuard<'_, HashSet<K>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}
