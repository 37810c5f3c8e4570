//! Control endpoints: local render controls and simulation commands
//! forwarded to the backend.
//!
//! Render controls never fail; they change the controller and wake the
//! render loop, taking effect on the next pass. Simulation commands are
//! forwarded as-is and the backend's reply is returned.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/render` | Controller state and options |
//! | `POST` | `/api/render/pause` | Freeze the displayed frame |
//! | `POST` | `/api/render/resume` | Unfreeze |
//! | `POST` | `/api/render/show-agents` | Toggle the agent overlay |
//! | `POST` | `/api/render/glyph-ramp` | Select a glyph ramp |
//! | `POST` | `/api/render/fps` | Set the frame-rate cap |
//! | `POST` | `/api/render/max-agents` | Set the agent cap |
//! | `POST` | `/api/sim/pause` | Pause the simulation |
//! | `POST` | `/api/sim/resume` | Resume the simulation |
//! | `POST` | `/api/sim/speed` | Set the simulation speed |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::Value;
use strata_render::{ControllerStatus, RenderController};
use strata_types::ControlCommand;
use tracing::info;

use crate::error::DashboardError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/render/show-agents`.
#[derive(Debug, serde::Deserialize)]
pub struct ShowAgentsRequest {
    /// Whether agents are overlaid.
    pub show: bool,
}

/// Request body for `POST /api/render/glyph-ramp`.
#[derive(Debug, serde::Deserialize)]
pub struct GlyphRampRequest {
    /// Ramp name (`standard`, `dense`, `blocks`, `minimal`, `dots`) or a
    /// literal character sequence, darkest first.
    pub ramp: String,
}

/// Request body for `POST /api/render/fps`.
#[derive(Debug, serde::Deserialize)]
pub struct FpsRequest {
    /// Frame-rate cap; clamped to `[1, 60]`.
    pub fps: u32,
}

/// Request body for `POST /api/render/max-agents`.
#[derive(Debug, serde::Deserialize)]
pub struct MaxAgentsRequest {
    /// Maximum agents placed per frame.
    pub max_agents: usize,
}

/// Request body for `POST /api/sim/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SpeedRequest {
    /// Speed multiplier; must be finite and positive.
    pub speed: f64,
}

/// Response for render controls.
#[derive(Debug, serde::Serialize)]
struct RenderResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
    /// Controller status after the change.
    render: ControllerStatus,
}

/// Response for forwarded simulation commands.
#[derive(Debug, serde::Serialize)]
struct SimResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
    /// The backend's reply.
    upstream: Value,
}

// ---------------------------------------------------------------------------
// Render controls
// ---------------------------------------------------------------------------

/// Return the controller state and current options.
pub async fn get_render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.lock().await.status())
}

/// Freeze the displayed frame. Updates keep being ingested.
pub async fn pause_render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    apply(&state, "Rendering paused", RenderController::pause).await
}

/// Unfreeze; anything ingested while paused is composed next.
pub async fn resume_render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    apply(&state, "Rendering resumed", RenderController::resume).await
}

/// Toggle the agent overlay.
pub async fn set_show_agents(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ShowAgentsRequest>,
) -> impl IntoResponse {
    let message = if body.show {
        "Agent overlay shown"
    } else {
        "Agent overlay hidden"
    };
    apply(&state, message, |c| c.set_show_agents(body.show)).await
}

/// Select a named ramp or a literal character sequence.
pub async fn set_glyph_ramp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GlyphRampRequest>,
) -> impl IntoResponse {
    let message = format!("Glyph ramp set to {:?}", body.ramp);
    apply(&state, &message, |c| c.set_glyph_ramp(&body.ramp)).await
}

/// Change the frame-rate cap.
pub async fn set_fps(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FpsRequest>,
) -> impl IntoResponse {
    apply(&state, "Frame-rate cap updated", |c| c.set_target_fps(body.fps)).await
}

/// Change the agent cap.
pub async fn set_max_agents(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MaxAgentsRequest>,
) -> impl IntoResponse {
    let message = format!("Agent cap set to {}", body.max_agents);
    apply(&state, &message, |c| c.set_max_agents(body.max_agents)).await
}

async fn apply<F>(state: &AppState, message: &str, change: F) -> Json<RenderResponse>
where
    F: FnOnce(&mut RenderController),
{
    let render = {
        let mut controller = state.controller.lock().await;
        change(&mut *controller);
        controller.status()
    };
    state.wake_renderer();
    Json(RenderResponse {
        ok: true,
        message: message.to_owned(),
        render,
    })
}

// ---------------------------------------------------------------------------
// Simulation commands
// ---------------------------------------------------------------------------

/// Forward a pause command to the backend.
pub async fn pause_sim(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    forward(&state, ControlCommand::Pause, "Simulation paused").await
}

/// Forward a resume command to the backend.
pub async fn resume_sim(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, DashboardError> {
    forward(&state, ControlCommand::Resume, "Simulation resumed").await
}

/// Forward a speed change to the backend.
pub async fn set_sim_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeedRequest>,
) -> Result<impl IntoResponse, DashboardError> {
    if !body.speed.is_finite() || body.speed <= 0.0 {
        return Err(DashboardError::InvalidRequest(format!(
            "speed must be a positive number, got {}",
            body.speed
        )));
    }
    let message = format!("Simulation speed set to {}", body.speed);
    forward(&state, ControlCommand::SetSpeed { speed: body.speed }, &message).await
}

async fn forward(
    state: &AppState,
    command: ControlCommand,
    message: &str,
) -> Result<Json<SimResponse>, DashboardError> {
    let api = state
        .api
        .as_ref()
        .ok_or_else(|| DashboardError::Unavailable("upstream client not configured".to_owned()))?;

    let upstream = api.send_command(command).await?;
    info!(command = command.path(), "Forwarded simulation command");

    Ok(Json(SimResponse {
        ok: true,
        message: message.to_owned(),
        upstream,
    }))
}
