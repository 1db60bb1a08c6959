//! Snapshot store: one engine, a cached snapshot and synchronous subscribers.
//!
//! Listeners receive the fresh snapshot by reference and have no path back to
//! the engine, so a notification can never re-enter `dispatch`/`tick`/`reset`.

use crate::code_blue::SimEngine;
use crate::engine::ScenarioEngine;
use cb_core::{IdSequence, SubscriptionId};

type Listener<S> = Box<dyn FnMut(&S)>;

pub struct SimStore<E: ScenarioEngine> {
    engine: E,
    snapshot: E::Snapshot,
    listeners: Vec<(SubscriptionId, Listener<E::Snapshot>)>,
    ids: IdSequence,
}

impl<E: ScenarioEngine> SimStore<E> {
    pub fn new(engine: E) -> Self {
        let snapshot = engine.snapshot();
        Self {
            engine,
            snapshot,
            listeners: Vec::new(),
            ids: IdSequence::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Snapshot as of the last committed mutation.
    pub fn snapshot(&self) -> &E::Snapshot {
        &self.snapshot
    }

    /// Register `listener`, called after every dispatch, tick and reset.
    pub fn subscribe(&mut self, listener: impl FnMut(&E::Snapshot) + 'static) -> SubscriptionId {
        let id = self.ids.next_id();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn dispatch(&mut self, action: E::Action) {
        self.engine.dispatch(action);
        self.commit();
    }

    pub fn tick(&mut self, dt_ms: f64) {
        self.engine.tick(dt_ms);
        self.commit();
    }

    pub fn reset(&mut self, scenario_id: &str) {
        self.engine.reset(scenario_id);
        self.commit();
    }

    fn commit(&mut self) {
        self.snapshot = self.engine.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&self.snapshot);
        }
    }
}

impl SimStore<SimEngine> {
    /// Reset to the catalog entry picked by `seed` and return its id.
    pub fn randomize(&mut self, seed: u64) -> String {
        let id = self.engine.catalog().pick(seed).id.clone();
        self.reset(&id);
        id
    }
}
