//! In-flight fetch registry
//!
//! The first caller to miss on a key becomes the leader and runs the fetch;
//! later callers for the same key park on a oneshot receiver until the leader
//! completes. A leader that fails or is dropped drops its waiters' senders, so
//! they observe a closed channel and fall back to their own fetch.
//!
//! The registry also owns the cache generation. `reset` bumps it while holding
//! the registry lock, and every write into the cache goes through
//! `commit_if_current`/`complete` under that same lock, so a fetch started
//! before a reset can never write into the cache after it.

use std::{collections::HashMap, hash::Hash};

use parking_lot::Mutex;
use tokio::sync::oneshot;

struct FlightState<K, V> {
    generation: u64,
    flights: HashMap<K, Vec<oneshot::Sender<V>>>,
}

pub(crate) struct FlightRegistry<K, V> {
    state: Mutex<FlightState<K, V>>,
}

pub(crate) enum Flight<'a, K, V>
where
    K: Eq + Hash,
{
    Leader(FlightLeader<'a, K, V>),
    Follower(oneshot::Receiver<V>),
}

pub(crate) struct FlightLeader<'a, K, V>
where
    K: Eq + Hash,
{
    registry: &'a FlightRegistry<K, V>,
    key: K,
    generation: u64,
    finished: bool,
}

impl<K, V> FlightRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FlightState {
                generation: 0,
                flights: HashMap::new(),
            }),
        }
    }

    /// Become the leader for `key`, or wait on the current leader
    pub(crate) fn join(&self, key: &K) -> Flight<'_, K, V> {
        let mut state = self.state.lock();
        let generation = state.generation;

        if let Some(waiters) = state.flights.get_mut(key) {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return Flight::Follower(rx);
        }

        state.flights.insert(key.clone(), Vec::new());
        Flight::Leader(FlightLeader {
            registry: self,
            key: key.clone(),
            generation,
            finished: false,
        })
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Run `commit` only if no reset happened since `generation` was read
    pub(crate) fn commit_if_current(&self, generation: u64, commit: impl FnOnce()) -> bool {
        let state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        commit();
        true
    }

    /// Start a new generation: run `clear` and detach every in-flight fetch.
    /// Returns the number of detached fetches.
    pub(crate) fn reset(&self, clear: impl FnOnce()) -> usize {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        clear();
        let detached = state.flights.len();
        state.flights.clear();
        detached
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.state.lock().flights.len()
    }
}

impl<K, V> FlightLeader<'_, K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Publish a successful fetch. `commit` runs (and waiters are woken) only
    /// when the flight still belongs to the current generation.
    pub(crate) fn complete(mut self, value: &V, commit: impl FnOnce()) -> bool {
        self.finished = true;

        let mut state = self.registry.state.lock();
        if state.generation != self.generation {
            return false;
        }

        commit();
        if let Some(waiters) = state.flights.remove(&self.key) {
            for waiter in waiters {
                let _ = waiter.send(value.clone());
            }
        }
        true
    }
}

impl<K, V> Drop for FlightLeader<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Failed or cancelled: release waiters so they fetch on their own
        let mut state = self.registry.state.lock();
        if state.generation == self.generation {
            state.flights.remove(&self.key);
        }
    }
}
