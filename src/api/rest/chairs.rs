use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::chair::Chair;
use crate::models::ride::Coordinate;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chairs", post(register_chair))
        .route("/chairs/:id/activity", post(update_activity))
        .route("/chairs/:id/coordinate", post(post_coordinate))
}

#[derive(Deserialize)]
pub struct RegisterChairRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub model: String,
}

#[derive(Deserialize)]
pub struct UpdateActivityRequest {
    pub available: bool,
}

#[derive(Deserialize)]
pub struct PostCoordinateRequest {
    pub latitude: i64,
    pub longitude: i64,
}

#[derive(Serialize)]
pub struct PostCoordinateResponse {
    pub recorded_at: i64,
    pub distance_delta: i64,
}

async fn register_chair(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterChairRequest>,
) -> Result<Json<Chair>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if !state.owners.contains_key(&payload.owner_id) {
        return Err(AppError::NotFound(format!(
            "owner {} not found",
            payload.owner_id
        )));
    }

    let chair = Chair {
        id: Uuid::new_v4().to_string(),
        owner_id: payload.owner_id,
        name: payload.name,
        model: payload.model,
        is_active: false,
        registered_at: Utc::now(),
    };

    state.chairs.insert(chair.id.clone(), chair.clone());
    Ok(Json(chair))
}

/// A chair reporting itself available is published to the vacant pool;
/// reporting unavailable retires it. Publishing an already-vacant
/// chair is a caller error and answers 409.
async fn update_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateActivityRequest>,
) -> Result<Json<Chair>, AppError> {
    let mut chair = state
        .chairs
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("chair {id} not found")))?;

    if payload.available {
        state.registry.publish(&id)?;
    } else {
        state.registry.retire(&id);
    }
    chair.is_active = payload.available;
    state.metrics.vacant_chairs.set(state.registry.len() as i64);

    Ok(Json(chair.clone()))
}

async fn post_coordinate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<PostCoordinateRequest>,
) -> Result<Json<PostCoordinateResponse>, AppError> {
    if !state.chairs.contains_key(&id) {
        return Err(AppError::NotFound(format!("chair {id} not found")));
    }

    let _gate = state
        .init_gate
        .read()
        .map_err(|_| AppError::Storage("initialization gate poisoned".to_string()))?;

    let recorded_at = Utc::now();
    let coordinate = Coordinate {
        latitude: payload.latitude,
        longitude: payload.longitude,
    };
    let delta = state
        .locations
        .append(&id, coordinate, recorded_at)
        .unwrap_or(0);
    state
        .counters
        .increment_distance(&id, delta, recorded_at.timestamp_millis());

    Ok(Json(PostCoordinateResponse {
        recorded_at: recorded_at.timestamp_millis(),
        distance_delta: delta,
    }))
}
