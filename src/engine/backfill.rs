use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Clone, Serialize)]
pub struct BackfillSummary {
    pub distance_chairs: usize,
    pub ride_count_chairs: usize,
    pub skipped: usize,
}

/// Recomputes every chair's counters from the authoritative history
/// and overwrites the counter store with the result.
///
/// Holds the initialization gate exclusively for the whole run, so no
/// live increment can interleave with the absolute writes. Chairs are
/// independent: an inconsistent record is logged and skipped without
/// aborting the rest. Counters are cleared first, which makes the run
/// idempotent on unchanged history.
pub fn run_backfill(state: &AppState) -> Result<BackfillSummary, AppError> {
    let _gate = state
        .init_gate
        .write()
        .map_err(|_| AppError::Storage("initialization gate poisoned".to_string()))?;

    state.counters.clear();
    let mut summary = BackfillSummary::default();

    for chair_id in state.locations.chair_ids() {
        if let Some((distance, updated_at)) = state.locations.total_distance(&chair_id) {
            state
                .counters
                .set_distance(&chair_id, distance, updated_at.timestamp_millis());
            state
                .metrics
                .backfill_chairs_total
                .with_label_values(&["ok"])
                .inc();
            summary.distance_chairs += 1;
        }
    }

    let mut ride_totals: HashMap<String, (i64, i64)> = HashMap::new();
    for entry in state.rides.iter() {
        let ride = entry.value();
        let Some(evaluation) = ride.evaluation else {
            continue;
        };
        match &ride.chair_id {
            Some(chair_id) => {
                let totals = ride_totals.entry(chair_id.clone()).or_default();
                totals.0 += 1;
                totals.1 += evaluation;
            }
            None => {
                // evaluated ride with no chair: the commit-atomicity
                // contract was broken for this record
                warn!(ride_id = %ride.id, "evaluated ride has no chair id, skipping");
                state
                    .metrics
                    .backfill_chairs_total
                    .with_label_values(&["failed"])
                    .inc();
                summary.skipped += 1;
            }
        }
    }
    for (chair_id, (ride_count, evaluation)) in ride_totals {
        state.counters.set_ride_count(&chair_id, ride_count, evaluation);
        summary.ride_count_chairs += 1;
    }

    info!(
        distance_chairs = summary.distance_chairs,
        ride_count_chairs = summary.ride_count_chairs,
        skipped = summary.skipped,
        "backfill finished"
    );

    Ok(summary)
}
