//! Dashboard service for the Strata simulation monitor.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Terrain view** (`GET /`) rendering the live ASCII frame in the
//!   browser
//! - **`WebSocket` endpoint** (`/ws/frames`) pushing every new frame via a
//!   [`tokio::sync::watch`] channel
//! - **REST endpoints** for the current frame, per-cell tooltips and the
//!   latest simulation data panels
//! - **Control endpoints** for local render settings and for commands
//!   forwarded to the simulation backend
//!
//! # Architecture
//!
//! ```text
//! StreamClient ─mpsc─► ingest ─► AppState.data
//!                                   │ (districts/agents changed)
//!                                   ▼
//!                         RenderController ◄─ render_loop (wake / rate cap)
//!                                   │
//!                                   ▼
//!                        watch<Arc<Frame>> ─► HTTP handlers, /ws/frames
//! ```
//!
//! Composition is synchronous and happens only in the render loop, on the
//! latest inputs, never faster than the configured frame rate.

pub mod config;
pub mod controls;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod render_loop;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod view;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{ConfigError, DashboardConfig};
pub use error::DashboardError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{Services, StartupError, spawn_dashboard};
pub use state::AppState;
