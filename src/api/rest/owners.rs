use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::fare::fare;
use crate::models::chair::Owner;
use crate::models::ride::RideStatus;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/owners", post(create_owner))
        .route("/owners/chairs", get(owner_chairs))
        .route("/owners/sales", get(owner_sales))
}

#[derive(Deserialize)]
pub struct CreateOwnerRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateOwnerResponse {
    pub id: Uuid,
    pub access_token: String,
}

#[derive(Serialize)]
pub struct OwnerChairsResponse {
    pub chairs: Vec<OwnerChairEntry>,
}

#[derive(Serialize)]
pub struct OwnerChairEntry {
    pub id: String,
    pub name: String,
    pub model: String,
    pub active: bool,
    pub registered_at: i64,
    pub total_distance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance_updated_at: Option<i64>,
}

#[derive(Deserialize)]
pub struct SalesWindow {
    pub since: Option<i64>,
    pub until: Option<i64>,
}

#[derive(Serialize)]
pub struct SalesResponse {
    pub total_sales: i64,
    pub chairs: Vec<ChairSales>,
    pub models: Vec<ModelSales>,
}

#[derive(Serialize)]
pub struct ChairSales {
    pub id: String,
    pub name: String,
    pub sales: i64,
}

#[derive(Serialize)]
pub struct ModelSales {
    pub model: String,
    pub sales: i64,
}

async fn create_owner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOwnerRequest>,
) -> Result<Json<CreateOwnerResponse>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let owner = Owner {
        id: Uuid::new_v4(),
        name: payload.name,
        access_token: format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ),
    };

    state.owner_tokens.insert(owner.access_token.clone(), owner.id);
    state.owners.insert(owner.id, owner.clone());

    Ok(Json(CreateOwnerResponse {
        id: owner.id,
        access_token: owner.access_token,
    }))
}

/// Resolves the bearer token through the read-through session cache;
/// the owner table stays the source of truth on a miss or stale hit.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Owner, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    state
        .sessions
        .lookup(token, |token| {
            let owner_id = *state.owner_tokens.get(token)?;
            state.owners.get(&owner_id).map(|o| o.value().clone())
        })
        .ok_or(AppError::Unauthorized)
}

/// Dashboard listing: every chair of the owner joined with its running
/// distance total. A chair with no recorded activity reads as zero
/// with no update timestamp.
async fn owner_chairs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<OwnerChairsResponse>, AppError> {
    let owner = authenticate(&state, &headers)?;

    let chairs: Vec<_> = state
        .chairs
        .iter()
        .filter(|entry| entry.value().owner_id == owner.id)
        .map(|entry| entry.value().clone())
        .collect();
    let chair_ids: Vec<String> = chairs.iter().map(|c| c.id.clone()).collect();
    let totals = state.counters.multi_get_distance(&chair_ids);

    let chairs = chairs
        .into_iter()
        .map(|chair| {
            let total = totals.get(&chair.id);
            OwnerChairEntry {
                registered_at: chair.registered_at.timestamp_millis(),
                total_distance: total.map_or(0, |t| t.total_distance),
                total_distance_updated_at: total.map(|t| t.updated_at),
                id: chair.id,
                name: chair.name,
                model: chair.model,
                active: chair.is_active,
            }
        })
        .collect();

    Ok(Json(OwnerChairsResponse { chairs }))
}

async fn owner_sales(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(window): Query<SalesWindow>,
) -> Result<Json<SalesResponse>, AppError> {
    let owner = authenticate(&state, &headers)?;
    let since = window.since.unwrap_or(i64::MIN);
    let until = window.until.unwrap_or(i64::MAX);

    let mut sales_by_chair: HashMap<String, i64> = HashMap::new();
    for entry in state.rides.iter() {
        let ride = entry.value();
        if ride.status != RideStatus::Completed {
            continue;
        }
        let Some(chair_id) = &ride.chair_id else {
            continue;
        };
        let completed_at = ride.updated_at.timestamp_millis();
        if completed_at < since || completed_at > until {
            continue;
        }
        *sales_by_chair.entry(chair_id.clone()).or_default() +=
            fare(ride.pickup, ride.destination);
    }

    let mut total_sales = 0;
    let mut chairs = Vec::new();
    let mut sales_by_model: HashMap<String, i64> = HashMap::new();
    for entry in state.chairs.iter() {
        let chair = entry.value();
        if chair.owner_id != owner.id {
            continue;
        }
        let sales = sales_by_chair.get(&chair.id).copied().unwrap_or(0);
        total_sales += sales;
        *sales_by_model.entry(chair.model.clone()).or_default() += sales;
        chairs.push(ChairSales {
            id: chair.id.clone(),
            name: chair.name.clone(),
            sales,
        });
    }

    let models = sales_by_model
        .into_iter()
        .map(|(model, sales)| ModelSales { model, sales })
        .collect();

    Ok(Json(SalesResponse {
        total_sales,
        chairs,
        models,
    }))
}
