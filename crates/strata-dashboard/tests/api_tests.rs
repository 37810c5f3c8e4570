//! Integration tests for the dashboard API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection. Forwarded simulation
//! commands are checked against a small fake backend on an ephemeral
//! port.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};
use strata_client::SimulationApi;
use strata_dashboard::ingest::apply_update;
use strata_dashboard::render_loop::render_pass;
use strata_dashboard::router::build_router;
use strata_dashboard::state::AppState;
use strata_render::RenderOptions;
use strata_types::{
    Agent, District, Rule, SimulationData, SimulationEvent, SimulationStatus, Snapshot,
    SnapshotUpdate,
};
use tower::ServiceExt;

fn options() -> RenderOptions {
    RenderOptions {
        width: 40,
        height: 10,
        ..RenderOptions::default()
    }
}

fn snapshot() -> SimulationData {
    let mut market = District::new("market", "Market", 0.9);
    market.population = Some(120.0);
    SimulationData {
        districts: vec![District::new("docks", "Docks", 0.2), market],
        agents: vec![
            Agent::new("a1", "docks"),
            Agent::new("a2", "market"),
            Agent::new("a3", "market"),
        ],
        events: vec![
            SimulationEvent {
                id: "e1".to_owned(),
                tick: Some(4),
                event_type: "riot".to_owned(),
                district: Some("market".to_owned()),
                ..SimulationEvent::default()
            },
            SimulationEvent {
                id: "e2".to_owned(),
                tick: Some(5),
                event_type: "trade".to_owned(),
                district: Some("docks".to_owned()),
                ..SimulationEvent::default()
            },
        ],
        rules: vec![Rule::default()],
        status: Some(SimulationStatus {
            tick: 5,
            ..SimulationStatus::default()
        }),
        ..SimulationData::default()
    }
}

/// State with one full snapshot ingested and composed.
async fn make_live_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new(options()));
    apply_update(&state, SnapshotUpdate::Full(Box::new(snapshot().into()))).await;
    assert!(render_pass(&state).await);
    state
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, 1024 * 1024 * 8).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let app = build_router(Arc::clone(state));
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    (status, body_to_json(resp.into_body()).await)
}

async fn post_json(state: &Arc<AppState>, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = build_router(Arc::clone(state));
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    (status, body_to_json(resp.into_body()).await)
}

// ---------------------------------------------------------------------------
// View and frame
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_serves_the_view() {
    let state = Arc::new(AppState::new(options()));
    let app = build_router(state);
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Strata"));
    assert!(html.contains("/ws/frames"));
}

#[tokio::test]
async fn frame_is_a_placeholder_before_data() {
    let state = Arc::new(AppState::new(options()));
    let (status, json) = get(&state, "/api/frame").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["placeholder"], true);
    assert_eq!(json["width"], 40);
    assert_eq!(json["rows"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn live_frame_covers_the_grid() {
    let state = make_live_state().await;
    let (status, json) = get(&state, "/api/frame").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["placeholder"], false);
    assert_eq!(json["stats"]["district_count"], 2);
    assert_eq!(json["stats"]["agent_count"], 3);

    for row in json["rows"].as_array().unwrap() {
        let width: usize = row["segments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["text"].as_str().unwrap().chars().count())
            .sum();
        assert_eq!(width, 40);
        assert!(row["perspective"]["scale_x"].is_number());
    }
    assert_eq!(json["metadata"].as_object().unwrap().len(), 400);
}

#[tokio::test]
async fn cell_lookup() {
    let state = make_live_state().await;

    let (status, json) = get(&state, "/api/frame/cell?x=3&y=4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "3,4");
    assert!(!json["cell"]["tooltip"].as_str().unwrap().is_empty());

    let (status, json) = get(&state, "/api/frame/cell?x=40&y=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn cell_lookup_requires_both_coordinates() {
    let state = make_live_state().await;
    let app = build_router(state);
    let req = Request::builder()
        .uri("/api/frame/cell?x=3")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn panels_return_latest_data() {
    let state = make_live_state().await;

    let (status, json) = get(&state, "/api/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["districts"][1]["name"], "Market");

    let (_, json) = get(&state, "/api/agents").await;
    assert_eq!(json["count"], 3);

    let (_, json) = get(&state, "/api/rules").await;
    assert_eq!(json["count"], 1);

    let (_, json) = get(&state, "/api/causality").await;
    assert_eq!(json["count"], 0);

    let (_, json) = get(&state, "/api/emotions").await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn events_can_be_filtered() {
    let state = make_live_state().await;

    let (_, json) = get(&state, "/api/events").await;
    assert_eq!(json["count"], 2);

    let (_, json) = get(&state, "/api/events?district=market").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["id"], "e1");

    let (_, json) = get(&state, "/api/events?tick=5").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["id"], "e2");

    let (_, json) = get(&state, "/api/events?limit=1").await;
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn failed_panel_fetch_keeps_the_last_panels() {
    let state = make_live_state().await;
    let polled = Snapshot {
        districts: snapshot().districts,
        agents: snapshot().agents,
        ..Snapshot::default()
    };
    apply_update(&state, SnapshotUpdate::Full(Box::new(polled))).await;

    let (_, json) = get(&state, "/api/events").await;
    assert_eq!(json["count"], 2);
    let (_, json) = get(&state, "/api/rules").await;
    assert_eq!(json["count"], 1);
    let (_, json) = get(&state, "/api/status").await;
    assert_eq!(json["simulation"]["tick"], 5);
}

#[tokio::test]
async fn status_reports_simulation_and_render() {
    let state = make_live_state().await;
    let (status, json) = get(&state, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["simulation"]["tick"], 5);
    assert_eq!(json["districts"], 2);
    assert_eq!(json["render"]["state"], "live");
    assert_eq!(json["upstream_enabled"], false);
}

#[tokio::test]
async fn connection_without_client_is_unavailable() {
    let state = Arc::new(AppState::new(options()));
    let (status, json) = get(&state, "/api/connection").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], 503);
}

// ---------------------------------------------------------------------------
// Render controls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn render_pause_and_resume() {
    let state = make_live_state().await;

    let (status, json) = post_json(&state, "/api/render/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["render"]["state"], "paused");

    // Data arriving while paused does not change the displayed frame.
    let before = state.current_frame();
    apply_update(
        &state,
        SnapshotUpdate::Districts(vec![District::new("new", "Newtown", 0.5)]),
    )
    .await;
    assert!(!render_pass(&state).await);
    assert!(Arc::ptr_eq(&before, &state.current_frame()));

    let (_, json) = post_json(&state, "/api/render/resume", None).await;
    assert_eq!(json["render"]["state"], "live");
    assert_eq!(json["render"]["pending"], true);

    // Wait out the frame-rate cap before the next pass.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(render_pass(&state).await);
    assert_eq!(state.current_frame().stats.district_count, 1);
}

#[tokio::test]
async fn render_options_take_effect_on_next_pass() {
    let state = make_live_state().await;

    let (_, json) = post_json(
        &state,
        "/api/render/glyph-ramp",
        Some(json!({"ramp": "blocks"})),
    )
    .await;
    assert_eq!(json["render"]["options"]["glyph_ramp"], "blocks");

    let (_, json) = post_json(&state, "/api/render/fps", Some(json!({"fps": 500}))).await;
    assert_eq!(json["render"]["options"]["target_fps"], 60);

    let (_, json) = post_json(
        &state,
        "/api/render/max-agents",
        Some(json!({"max_agents": 1})),
    )
    .await;
    assert_eq!(json["render"]["options"]["max_agents"], 1);

    let (_, json) = post_json(
        &state,
        "/api/render/show-agents",
        Some(json!({"show": false})),
    )
    .await;
    assert_eq!(json["render"]["options"]["show_agents"], false);
    assert_eq!(json["render"]["pending"], true);

    let (_, json) = get(&state, "/api/render").await;
    assert_eq!(json["options"]["glyph_ramp"], "blocks");
}

#[tokio::test]
async fn malformed_control_body_is_rejected() {
    let state = make_live_state().await;
    let (status, _) = {
        let app = build_router(Arc::clone(&state));
        let req = Request::builder()
            .method("POST")
            .uri("/api/render/fps")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"fps": "fast"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        (resp.status(), ())
    };
    assert!(status.is_client_error());
}

// ---------------------------------------------------------------------------
// Simulation controls
// ---------------------------------------------------------------------------

async fn control(Path(command): Path<String>, body: Bytes) -> Json<Value> {
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    Json(json!({"accepted": command, "body": body}))
}

async fn spawn_backend() -> String {
    let app = axum::Router::new().route("/api/control/{command}", post(control));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn sim_controls_without_upstream_are_unavailable() {
    let state = Arc::new(AppState::new(options()));
    let (status, json) = post_json(&state, "/api/sim/pause", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn sim_controls_are_forwarded() {
    let base = spawn_backend().await;
    let api = SimulationApi::new(&base, Duration::from_secs(2)).unwrap();
    let state = Arc::new(AppState::new(options()).with_api(api));

    let (status, json) = post_json(&state, "/api/sim/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upstream"]["accepted"], "pause");

    let (status, json) = post_json(&state, "/api/sim/speed", Some(json!({"speed": 3.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upstream"]["accepted"], "speed");
    assert_eq!(json["upstream"]["body"]["speed"], json!(3.0));
}

#[tokio::test]
async fn invalid_speed_is_rejected_before_forwarding() {
    let base = spawn_backend().await;
    let api = SimulationApi::new(&base, Duration::from_secs(2)).unwrap();
    let state = Arc::new(AppState::new(options()).with_api(api));

    let (status, json) = post_json(&state, "/api/sim/speed", Some(json!({"speed": -1.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = SimulationApi::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let state = Arc::new(AppState::new(options()).with_api(api));

    let (status, json) = post_json(&state, "/api/sim/resume", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], 502);
}
