use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::fare::manhattan_distance;
use crate::models::ride::Coordinate;

#[derive(Debug, Clone, Copy)]
pub struct ChairLocation {
    pub coordinate: Coordinate,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only per-chair position history. This is the authoritative
/// source the distance backfill recomputes from; live appends also
/// yield the incremental delta pushed into the counter store.
#[derive(Default)]
pub struct LocationLog {
    by_chair: DashMap<String, Vec<ChairLocation>>,
}

impl LocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a position and returns the Manhattan delta from the
    /// chair's previous position, or None for the first record.
    pub fn append(
        &self,
        chair_id: &str,
        coordinate: Coordinate,
        recorded_at: DateTime<Utc>,
    ) -> Option<i64> {
        let mut log = self.by_chair.entry(chair_id.to_string()).or_default();
        let delta = log
            .last()
            .map(|prev| manhattan_distance(prev.coordinate, coordinate));
        log.push(ChairLocation {
            coordinate,
            recorded_at,
        });
        delta
    }

    /// Cumulative travelled distance (sum of consecutive-position
    /// deltas) and the timestamp of the latest contributing record.
    /// None if the chair has no history.
    pub fn total_distance(&self, chair_id: &str) -> Option<(i64, DateTime<Utc>)> {
        let log = self.by_chair.get(chair_id)?;
        let last = log.last()?;

        let total = log
            .windows(2)
            .map(|pair| manhattan_distance(pair[0].coordinate, pair[1].coordinate))
            .sum();

        Some((total, last.recorded_at))
    }

    pub fn chair_ids(&self) -> Vec<String> {
        self.by_chair.iter().map(|e| e.key().clone()).collect()
    }
}
