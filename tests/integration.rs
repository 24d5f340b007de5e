use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ride_dispatch::api::rest::router;
use ride_dispatch::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(1024, 1024, 60));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_owner(app: &axum::Router, name: &str) -> (Uuid, String) {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/owners", json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    (
        body["id"].as_str().unwrap().parse().unwrap(),
        body["access_token"].as_str().unwrap().to_string(),
    )
}

async fn create_chair(app: &axum::Router, owner_id: Uuid, name: &str, model: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/chairs",
            json!({ "owner_id": owner_id, "name": name, "model": model }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    body["id"].as_str().unwrap().to_string()
}

async fn publish_chair(app: &axum::Router, chair_id: &str) {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/chairs/{chair_id}/activity"),
            json!({ "available": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn create_ride(app: &axum::Router) -> Uuid {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/rides",
            json!({
                "user_id": Uuid::new_v4(),
                "pickup": { "latitude": 0, "longitude": 0 },
                "destination": { "latitude": 3, "longitude": 4 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "Matching");
    assert!(body["chair_id"].is_null());
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn post_coordinate(app: &axum::Router, chair_id: &str, latitude: i64, longitude: i64) {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/chairs/{chair_id}/coordinate"),
            json!({ "latitude": latitude, "longitude": longitude }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rides"], 0);
    assert_eq!(body["chairs"], 0);
    assert_eq!(body["vacant_chairs"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("vacant_chairs"));
}

#[tokio::test]
async fn create_owner_issues_a_token() {
    let (app, _state) = setup();
    let (_, token) = create_owner(&app, "Acme Chairs").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn owner_endpoints_require_a_token() {
    let (app, _state) = setup();
    let response = app
        .clone()
        .oneshot(get_request("/owners/chairs"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(authed_get("/owners/sales", "bogus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_chair_rejects_unknown_owner() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/chairs",
            json!({ "owner_id": Uuid::new_v4(), "name": "X-1", "model": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_publish_is_a_conflict() {
    let (app, _state) = setup();
    let (owner_id, _) = create_owner(&app, "Acme").await;
    let chair_id = create_chair(&app, owner_id, "X-1", "A").await;
    publish_chair(&app, &chair_id).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/chairs/{chair_id}/activity"),
            json!({ "available": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn matching_with_no_vacant_chair_is_no_work() {
    let (app, _state) = setup();
    let ride_id = create_ride(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/internal/matching"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // the ride is untouched and still eligible
    let response = app
        .oneshot(get_request(&format!("/rides/{ride_id}")))
        .await
        .unwrap();
    let ride = body_json(response).await;
    assert_eq!(ride["status"], "Matching");
    assert!(ride["chair_id"].is_null());
}

#[tokio::test]
async fn full_matching_flow() {
    let (app, _state) = setup();
    let (owner_id, _) = create_owner(&app, "Acme").await;
    let chair_id = create_chair(&app, owner_id, "X-1", "A").await;
    publish_chair(&app, &chair_id).await;
    let ride_id = create_ride(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/internal/matching"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pairing = body_json(response).await;
    assert_eq!(pairing["ride_id"], ride_id.to_string());
    assert_eq!(pairing["chair_id"], chair_id);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/rides/{ride_id}")))
        .await
        .unwrap();
    let ride = body_json(response).await;
    assert_eq!(ride["status"], "Matched");
    assert_eq!(ride["chair_id"], chair_id);

    // nothing left to match, and the claimed chair is gone
    let response = app
        .oneshot(get_request("/internal/matching"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn evaluation_completes_the_ride_and_feeds_sales() {
    let (app, _state) = setup();
    let (owner_id, token) = create_owner(&app, "Acme").await;
    let chair_id = create_chair(&app, owner_id, "X-1", "A").await;
    publish_chair(&app, &chair_id).await;
    let ride_id = create_ride(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/internal/matching"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{ride_id}/evaluation"),
            json!({ "evaluation": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ride = body_json(response).await;
    assert_eq!(ride["status"], "Completed");
    assert_eq!(ride["evaluation"], 4);

    // evaluating twice is a conflict
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{ride_id}/evaluation"),
            json!({ "evaluation": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // pickup (0,0) -> destination (3,4): 500 + 100 * 7
    let response = app
        .oneshot(authed_get("/owners/sales", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sales = body_json(response).await;
    assert_eq!(sales["total_sales"], 1200);
    assert_eq!(sales["chairs"][0]["id"], chair_id);
    assert_eq!(sales["chairs"][0]["sales"], 1200);
    assert_eq!(sales["models"][0]["model"], "A");
    assert_eq!(sales["models"][0]["sales"], 1200);
}

#[tokio::test]
async fn evaluating_an_unmatched_ride_is_rejected() {
    let (app, _state) = setup();
    let ride_id = create_ride(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{ride_id}/evaluation"),
            json!({ "evaluation": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/rides/{ride_id}/evaluation"),
            json!({ "evaluation": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backfill_seeds_the_dashboard_totals() {
    let (app, _state) = setup();
    let (owner_id, token) = create_owner(&app, "Acme").await;
    let chair_id = create_chair(&app, owner_id, "X-1", "A").await;

    // consecutive deltas 3, 0, 5
    post_coordinate(&app, &chair_id, 0, 0).await;
    post_coordinate(&app, &chair_id, 1, 2).await;
    post_coordinate(&app, &chair_id, 1, 2).await;
    post_coordinate(&app, &chair_id, 4, 4).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/initialize", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["distance_chairs"], 1);

    let response = app
        .oneshot(authed_get("/owners/chairs", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let chair = &body["chairs"][0];
    assert_eq!(chair["id"], chair_id);
    assert_eq!(chair["total_distance"], 8);
    assert!(chair["total_distance_updated_at"].as_i64().is_some());
}

#[tokio::test]
async fn estimated_fare_quotes_the_trip() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/rides/estimated-fare",
            json!({
                "pickup": { "latitude": 10, "longitude": 20 },
                "destination": { "latitude": 13, "longitude": 16 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["distance"], 7);
    assert_eq!(body["fare"], 1200);
}

#[tokio::test]
async fn chair_with_no_activity_reads_as_zero_distance() {
    let (app, _state) = setup();
    let (owner_id, token) = create_owner(&app, "Acme").await;
    create_chair(&app, owner_id, "X-1", "A").await;

    let response = app
        .oneshot(authed_get("/owners/chairs", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    let chair = &body["chairs"][0];
    assert_eq!(chair["total_distance"], 0);
    assert!(chair.get("total_distance_updated_at").is_none());
}
