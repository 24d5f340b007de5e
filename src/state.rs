use std::sync::RwLock;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::matching::MatchEvent;
use crate::models::chair::{Chair, Owner};
use crate::models::ride::Ride;
use crate::observability::metrics::Metrics;
use crate::session::SessionCache;
use crate::store::counters::CounterStore;
use crate::store::locations::LocationLog;
use crate::store::registry::VacantChairRegistry;

pub struct AppState {
    pub rides: DashMap<Uuid, Ride>,
    pub chairs: DashMap<String, Chair>,
    pub owners: DashMap<Uuid, Owner>,
    pub owner_tokens: DashMap<String, Uuid>,
    pub registry: VacantChairRegistry,
    pub counters: CounterStore,
    pub locations: LocationLog,
    pub sessions: SessionCache,
    /// Serializes backfill's absolute counter writes against live
    /// increments: updaters hold a read guard, backfill the write guard.
    pub init_gate: RwLock<()>,
    pub match_events_tx: broadcast::Sender<MatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        session_cache_capacity: usize,
        session_ttl_seconds: i64,
    ) -> Self {
        let (match_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            rides: DashMap::new(),
            chairs: DashMap::new(),
            owners: DashMap::new(),
            owner_tokens: DashMap::new(),
            registry: VacantChairRegistry::new(),
            counters: CounterStore::new(),
            locations: LocationLog::new(),
            sessions: SessionCache::new(session_cache_capacity, session_ttl_seconds),
            init_gate: RwLock::new(()),
            match_events_tx,
            metrics: Metrics::new(),
        }
    }
}
