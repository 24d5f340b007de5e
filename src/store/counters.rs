use std::collections::HashMap;

use dashmap::DashMap;

/// Running distance total for one chair. `updated_at` is unix
/// milliseconds of the latest contributing location record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistanceTotal {
    pub total_distance: i64,
    pub updated_at: i64,
}

/// Completed-ride totals for one chair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RideTotal {
    pub ride_count: i64,
    pub evaluation: i64,
}

/// Per-chair aggregate counters.
///
/// Every mutation is an atomic increment or an absolute set performed
/// under a single map-entry lock; there is no read-modify-write across
/// a lock release, so concurrent increments can never lose updates.
/// Reads distinguish "no recorded activity" (key absent) from zero.
#[derive(Default)]
pub struct CounterStore {
    distances: DashMap<String, DistanceTotal>,
    rides: DashMap<String, RideTotal>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a travelled delta and stamps the observation time. Both
    /// fields change under one entry lock, together or not at all.
    pub fn increment_distance(&self, chair_id: &str, delta: i64, observed_at: i64) {
        let mut record = self
            .distances
            .entry(chair_id.to_string())
            .or_insert_with(DistanceTotal::default);
        record.total_distance += delta;
        record.updated_at = observed_at;
    }

    /// Counts one completed ride and accumulates its evaluation score.
    pub fn increment_ride_count(&self, chair_id: &str, evaluation_delta: i64) {
        let mut record = self
            .rides
            .entry(chair_id.to_string())
            .or_insert_with(RideTotal::default);
        record.ride_count += 1;
        record.evaluation += evaluation_delta;
    }

    /// Absolute overwrite, reserved for backfill.
    pub fn set_distance(&self, chair_id: &str, total_distance: i64, updated_at: i64) {
        self.distances.insert(
            chair_id.to_string(),
            DistanceTotal {
                total_distance,
                updated_at,
            },
        );
    }

    /// Absolute overwrite, reserved for backfill.
    pub fn set_ride_count(&self, chair_id: &str, ride_count: i64, evaluation: i64) {
        self.rides.insert(
            chair_id.to_string(),
            RideTotal {
                ride_count,
                evaluation,
            },
        );
    }

    /// Batched read; chairs with no recorded activity are absent from
    /// the result rather than reported as zero.
    pub fn multi_get_distance(&self, chair_ids: &[String]) -> HashMap<String, DistanceTotal> {
        chair_ids
            .iter()
            .filter_map(|id| self.distances.get(id).map(|v| (id.clone(), *v)))
            .collect()
    }

    pub fn multi_get_ride_count(&self, chair_ids: &[String]) -> HashMap<String, RideTotal> {
        chair_ids
            .iter()
            .filter_map(|id| self.rides.get(id).map(|v| (id.clone(), *v)))
            .collect()
    }

    /// Drops every record. Backfill clears before rewriting so stale
    /// chairs do not survive a rebuild.
    pub fn clear(&self) {
        self.distances.clear();
        self.rides.clear();
    }
}
