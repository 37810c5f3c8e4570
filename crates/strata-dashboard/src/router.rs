//! Axum router construction for the dashboard.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controls;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the dashboard.
///
/// The router includes:
/// - `GET /` -- terrain view
/// - `GET /ws/frames` -- `WebSocket` frame stream
/// - `GET /api/frame`, `GET /api/frame/cell` -- current frame and tooltips
/// - `GET|POST /api/render/...` -- render controls
/// - `GET /api/{districts,agents,events,causality,emotions,rules,status}`
///   -- latest simulation data
/// - `GET /api/connection` -- stream client status
/// - `POST /api/sim/{pause,resume,speed}` -- forwarded to the backend
///
/// CORS is configured to allow any origin for development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // View
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/frames", get(ws::ws_frames))
        // Frame
        .route("/api/frame", get(handlers::get_frame))
        .route("/api/frame/cell", get(handlers::get_cell))
        // Render controls
        .route("/api/render", get(controls::get_render))
        .route("/api/render/pause", post(controls::pause_render))
        .route("/api/render/resume", post(controls::resume_render))
        .route("/api/render/show-agents", post(controls::set_show_agents))
        .route("/api/render/glyph-ramp", post(controls::set_glyph_ramp))
        .route("/api/render/fps", post(controls::set_fps))
        .route("/api/render/max-agents", post(controls::set_max_agents))
        // Simulation data
        .route("/api/districts", get(handlers::list_districts))
        .route("/api/agents", get(handlers::list_agents))
        .route("/api/events", get(handlers::list_events))
        .route("/api/causality", get(handlers::list_causality))
        .route("/api/emotions", get(handlers::list_emotions))
        .route("/api/rules", get(handlers::list_rules))
        .route("/api/status", get(handlers::get_status))
        .route("/api/connection", get(handlers::get_connection))
        // Simulation controls
        .route("/api/sim/pause", post(controls::pause_sim))
        .route("/api/sim/resume", post(controls::resume_sim))
        .route("/api/sim/speed", post(controls::set_sim_speed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
