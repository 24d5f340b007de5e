use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::fare::{fare, manhattan_distance};
use crate::models::ride::{Coordinate, Ride, RideStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/estimated-fare", post(estimated_fare))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/evaluation", post(evaluate_ride))
}

#[derive(Deserialize)]
pub struct CreateRideRequest {
    pub user_id: Uuid,
    pub pickup: Coordinate,
    pub destination: Coordinate,
}

#[derive(Deserialize)]
pub struct EstimatedFareRequest {
    pub pickup: Coordinate,
    pub destination: Coordinate,
}

#[derive(Serialize)]
pub struct EstimatedFareResponse {
    pub fare: i64,
    pub distance: i64,
}

#[derive(Deserialize)]
pub struct EvaluateRideRequest {
    pub evaluation: i64,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<Ride>, AppError> {
    let now = Utc::now();
    let ride = Ride {
        id: Uuid::new_v4(),
        user_id: payload.user_id,
        pickup: payload.pickup,
        destination: payload.destination,
        chair_id: None,
        status: RideStatus::Matching,
        evaluation: None,
        created_at: now,
        updated_at: now,
    };

    state.rides.insert(ride.id, ride.clone());
    Ok(Json(ride))
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, AppError> {
    let ride = state
        .rides
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("ride {id} not found")))?;

    Ok(Json(ride.value().clone()))
}

async fn estimated_fare(
    Json(payload): Json<EstimatedFareRequest>,
) -> Json<EstimatedFareResponse> {
    Json(EstimatedFareResponse {
        fare: fare(payload.pickup, payload.destination),
        distance: manhattan_distance(payload.pickup, payload.destination),
    })
}

/// Completes a matched ride with an evaluation score and pushes the
/// live ride-count increment. The ride is immutable afterwards.
async fn evaluate_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluateRideRequest>,
) -> Result<Json<Ride>, AppError> {
    if !(1..=5).contains(&payload.evaluation) {
        return Err(AppError::BadRequest(
            "evaluation must be between 1 and 5".to_string(),
        ));
    }

    let _gate = state
        .init_gate
        .read()
        .map_err(|_| AppError::Storage("initialization gate poisoned".to_string()))?;

    let mut ride = state
        .rides
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("ride {id} not found")))?;

    match ride.status {
        RideStatus::Matching => {
            return Err(AppError::BadRequest(format!(
                "ride {id} is not yet matched"
            )));
        }
        RideStatus::Completed => {
            return Err(AppError::Conflict(format!(
                "ride {id} is already completed"
            )));
        }
        RideStatus::Matched => {}
    }
    let Some(chair_id) = ride.chair_id.clone() else {
        return Err(AppError::ConsistencyViolation(format!(
            "ride {id} is matched but has no chair id"
        )));
    };

    ride.evaluation = Some(payload.evaluation);
    ride.status = RideStatus::Completed;
    ride.updated_at = Utc::now();
    let completed = ride.clone();
    drop(ride);

    state
        .counters
        .increment_ride_count(&chair_id, payload.evaluation);

    Ok(Json(completed))
}
