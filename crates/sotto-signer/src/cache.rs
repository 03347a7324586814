//! Single-flight memoization for backend calls
//!
//! Every underlying extension call may raise a user-facing approval prompt,
//! so duplicate calls are expensive in attention, not just time. The cache
//! guarantees at most one in-flight backend call per distinct key:
//! concurrent callers with the same key share one flight, and a completed
//! success is returned to later callers without touching the backend again.
//!
//! Failed flights are evicted so a retry can reach the backend; successes
//! persist until [`SingleFlight::clear`].

use std::collections::HashMap;
use std::hash::Hash;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::SignerError;

type Flight<V> = Shared<BoxFuture<'static, Result<V, SignerError>>>;

/// Per-instance coalescing cache
pub(crate) struct SingleFlight<K, V> {
    flights: Mutex<HashMap<K, Flight<V>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Join the existing flight for `key`, or start one with `call`
    pub async fn get_or_call<F>(&self, key: K, call: F) -> Result<V, SignerError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, SignerError>>,
    {
        let flight = {
            let mut flights = self.flights.lock();
            match flights.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let flight = call().shared();
                    flights.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        let result = flight.clone().await;
        if result.is_err() {
            // evict only our own flight; a replacement started by another
            // caller stays untouched
            let mut flights = self.flights.lock();
            if flights.get(&key).is_some_and(|current| current.ptr_eq(&flight)) {
                flights.remove(&key);
            }
        }
        result
    }

    /// Drop every cached flight, in-flight or completed
    pub fn clear(&self) {
        self.flights.lock().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.flights.lock().len()
    }
}
