use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::try_result::TryResult;
use serde::Serialize;
use tokio::time::{interval, Duration};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ride::RideStatus;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct MatchEvent {
    pub ride_id: Uuid,
    pub chair_id: String,
    pub matched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched(MatchEvent),
    /// Nothing to match: no pending ride, or no claimable chair. Not a
    /// failure; the ride (if any) stays eligible for the next pass.
    NoWork,
}

/// One dispatch pass: pair the oldest unmatched ride with one vacant
/// chair, committing both sides together.
///
/// Candidates are visited in strict FIFO order (created_at, then id).
/// A ride entry held by a concurrent dispatcher is skipped rather than
/// awaited, the in-memory equivalent of `FOR UPDATE SKIP LOCKED`; a
/// candidate that got matched between the snapshot and the lock is
/// skipped the same way. The chair is claimed and the ride mutated
/// while the ride entry is exclusively held, so no half-committed
/// pairing is ever observable.
pub fn match_once(state: &AppState) -> Result<MatchOutcome, AppError> {
    let mut candidates: Vec<(DateTime<Utc>, Uuid)> = state
        .rides
        .iter()
        .filter(|entry| entry.value().chair_id.is_none())
        .map(|entry| (entry.value().created_at, *entry.key()))
        .collect();
    candidates.sort();

    for (_, ride_id) in candidates {
        let mut ride = match state.rides.try_get_mut(&ride_id) {
            TryResult::Present(ride) => ride,
            // another dispatcher holds this row
            TryResult::Locked => continue,
            TryResult::Absent => continue,
        };

        if ride.chair_id.is_some() {
            // matched since the snapshot was taken
            continue;
        }
        if ride.status != RideStatus::Matching {
            return Err(AppError::ConsistencyViolation(format!(
                "ride {} has status {:?} but no chair id",
                ride.id, ride.status
            )));
        }

        let Some(chair_id) = state.registry.claim_one() else {
            // no claimable chair; the selected ride is left untouched
            return Ok(MatchOutcome::NoWork);
        };

        ride.chair_id = Some(chair_id.clone());
        ride.status = RideStatus::Matched;
        ride.updated_at = Utc::now();
        let event = MatchEvent {
            ride_id: ride.id,
            chair_id,
            matched_at: ride.updated_at,
        };
        drop(ride);

        state.metrics.vacant_chairs.set(state.registry.len() as i64);
        let _ = state.match_events_tx.send(event.clone());

        return Ok(MatchOutcome::Matched(event));
    }

    Ok(MatchOutcome::NoWork)
}

/// `match_once` wrapped with outcome metrics and latency recording;
/// both the interval loop and the HTTP trigger go through here.
pub fn dispatch_pass(state: &AppState) -> Result<MatchOutcome, AppError> {
    let start = Instant::now();
    let result = match_once(state);

    let outcome = match &result {
        Ok(MatchOutcome::Matched(_)) => "matched",
        Ok(MatchOutcome::NoWork) => "no_work",
        Err(_) => "error",
    };
    state
        .metrics
        .match_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .matches_total
        .with_label_values(&[outcome])
        .inc();

    result
}

pub async fn run_matching_loop(state: Arc<AppState>, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "matching loop started");

    let mut ticker = interval(period);
    loop {
        ticker.tick().await;

        match dispatch_pass(&state) {
            Ok(MatchOutcome::Matched(event)) => {
                info!(
                    ride_id = %event.ride_id,
                    chair_id = %event.chair_id,
                    "ride matched"
                );
            }
            Ok(MatchOutcome::NoWork) => {}
            Err(err) => {
                error!(error = %err, "dispatch pass failed");
            }
        }
    }
}
