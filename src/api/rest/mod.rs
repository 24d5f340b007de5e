pub mod chairs;
pub mod owners;
pub mod rides;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::engine::backfill::{run_backfill, BackfillSummary};
use crate::engine::matching::{dispatch_pass, MatchOutcome};
use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(owners::router())
        .merge(chairs::router())
        .merge(rides::router())
        .route("/internal/matching", get(internal_matching))
        .route("/initialize", post(initialize))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    rides: usize,
    chairs: usize,
    vacant_chairs: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rides: state.rides.len(),
        chairs: state.chairs.len(),
        vacant_chairs: state.registry.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

/// Entry point for an external periodic scheduler: one dispatch pass.
/// 200 with the pairing on a match, 204 when there was nothing to do;
/// a storage failure propagates as an error, never as idleness.
async fn internal_matching(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    match dispatch_pass(&state)? {
        MatchOutcome::Matched(event) => Ok((StatusCode::OK, Json(event)).into_response()),
        MatchOutcome::NoWork => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn initialize(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BackfillSummary>, AppError> {
    let summary = run_backfill(&state)?;
    Ok(Json(summary))
}
