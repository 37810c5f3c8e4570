//! Read-only REST handlers: the view, the frame, and the data panels.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | HTML view |
//! | `GET` | `/api/frame` | Current frame |
//! | `GET` | `/api/frame/cell?x=&y=` | Tooltip metadata for one cell |
//! | `GET` | `/api/districts` | Latest districts |
//! | `GET` | `/api/agents` | Latest agents |
//! | `GET` | `/api/events` | Latest event log |
//! | `GET` | `/api/causality` | Latest causal links |
//! | `GET` | `/api/emotions` | Latest emotion readings |
//! | `GET` | `/api/rules` | Latest rules |
//! | `GET` | `/api/status` | Run status plus dashboard counters |
//! | `GET` | `/api/connection` | Stream client status |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use serde::Serialize;
use serde_json::Value;
use strata_render::cell_key;

use crate::error::DashboardError;
use crate::state::AppState;
use crate::view;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/frame/cell`.
#[derive(Debug, serde::Deserialize)]
pub struct CellQuery {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

/// Query parameters for `GET /api/events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Only events of this tick.
    pub tick: Option<u64>,
    /// Only events in this district.
    pub district: Option<String>,
    /// Maximum number of events to return (default 100, max 1000).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- HTML view
// ---------------------------------------------------------------------------

/// Serve the self-contained terrain view.
#[allow(clippy::unused_async)]
pub async fn index() -> impl IntoResponse {
    Html(view::INDEX_HTML)
}

// ---------------------------------------------------------------------------
// GET /api/frame -- current frame
// ---------------------------------------------------------------------------

/// Return the newest published frame.
#[allow(clippy::unused_async)]
pub async fn get_frame(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let frame = state.current_frame();
    Ok(Json(serde_json::to_value(frame.as_ref())?))
}

/// Return the tooltip metadata for one cell of the newest frame.
#[allow(clippy::unused_async)]
pub async fn get_cell(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CellQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    let frame = state.current_frame();
    if params.x >= frame.width || params.y >= frame.height {
        return Err(DashboardError::InvalidRequest(format!(
            "cell ({}, {}) outside {}x{} frame",
            params.x, params.y, frame.width, frame.height
        )));
    }
    let meta = frame
        .cell(params.x, params.y)
        .ok_or_else(|| DashboardError::NotFound(format!("cell {}", cell_key(params.x, params.y))))?;

    Ok(Json(serde_json::json!({
        "x": params.x,
        "y": params.y,
        "key": cell_key(params.x, params.y),
        "cell": meta,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/{collection} -- data panels
// ---------------------------------------------------------------------------

/// List the latest districts.
pub async fn list_districts(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    listing("districts", &data.districts)
}

/// List the latest agents.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    listing("agents", &data.agents)
}

/// List the latest events, optionally filtered.
///
/// # Query Parameters
///
/// - `tick`: only events of this tick
/// - `district`: only events in this district
/// - `limit`: maximum number returned (default 100, max 1000)
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    let limit = params.limit.unwrap_or(100).min(1000);

    let events: Vec<_> = data
        .events
        .iter()
        .filter(|e| params.tick.is_none_or(|tick| e.tick == Some(tick)))
        .filter(|e| {
            params
                .district
                .as_deref()
                .is_none_or(|d| e.district.as_deref() == Some(d))
        })
        .take(limit)
        .collect();

    listing("events", &events)
}

/// List the latest causal links.
pub async fn list_causality(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    listing("causality", &data.causality)
}

/// List the latest emotion readings.
pub async fn list_emotions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    listing("emotions", &data.emotions)
}

/// List the latest rules.
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let data = state.data.read().await;
    listing("rules", &data.rules)
}

/// Return the simulation run status plus dashboard-side counters.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let (simulation, districts, agents) = {
        let data = state.data.read().await;
        (data.status.clone(), data.districts.len(), data.agents.len())
    };
    let render = state.controller.lock().await.status();
    let uptime_seconds = chrono::Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();

    Ok(Json(serde_json::json!({
        "simulation": simulation,
        "districts": districts,
        "agents": agents,
        "render": render,
        "upstream_enabled": state.api.is_some(),
        "uptime_seconds": uptime_seconds,
    })))
}

/// Return the stream client's connection report.
#[allow(clippy::unused_async)]
pub async fn get_connection(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    let report = state
        .connection()
        .ok_or_else(|| DashboardError::Unavailable("upstream client not configured".to_owned()))?;
    Ok(Json(serde_json::to_value(report)?))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `{"count": n, "<key>": [...]}`.
fn listing<T: Serialize>(key: &str, items: &[T]) -> Result<Json<Value>, DashboardError> {
    let mut body = serde_json::Map::new();
    body.insert("count".to_owned(), Value::from(items.len()));
    body.insert(key.to_owned(), serde_json::to_value(items)?);
    Ok(Json(Value::Object(body)))
}
