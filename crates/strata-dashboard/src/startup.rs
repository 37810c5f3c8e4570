//! Dashboard startup: wires the upstream client, ingest, render loop and
//! HTTP server together on background Tokio tasks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata_dashboard::config::DashboardConfig;
//! use strata_dashboard::startup::spawn_dashboard;
//!
//! let (config, _) = DashboardConfig::load()?;
//! let services = spawn_dashboard(&config)?;
//! tokio::signal::ctrl_c().await?;
//! services.shutdown().await;
//! ```

use std::sync::Arc;

use strata_client::{ClientError, ClientHandle, StreamClient};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::DashboardConfig;
use crate::ingest::run_ingest;
use crate::render_loop::run_render_loop;
use crate::server::{ServerError, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server address is invalid.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The upstream client could not be built.
    #[error("upstream client error: {0}")]
    Client(#[from] ClientError),
}

/// Handles to everything [`spawn_dashboard`] started.
pub struct Services {
    /// Shared state, for embedding callers.
    pub state: Arc<AppState>,
    shutdown: watch::Sender<bool>,
    client: Option<ClientHandle>,
    ingest: Option<JoinHandle<()>>,
    render: JoinHandle<()>,
    server: JoinHandle<()>,
}

/// Spawn the dashboard on background tasks.
///
/// When `upstream.enabled` is set the stream client is connected and its
/// updates are ingested; otherwise the dashboard serves the placeholder
/// frame and the simulation controls answer 503.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listen address does not parse,
/// or [`StartupError::Client`] if the HTTP client cannot be built. Bind
/// failures happen on the server task and are logged there.
pub fn spawn_dashboard(config: &DashboardConfig) -> Result<Services, StartupError> {
    let server_config = config.server_config();
    let addr = server_config.socket_addr()?;

    let mut state = AppState::new(config.render.clone());
    let mut client = None;
    let mut updates = None;
    if config.upstream.enabled {
        let stream_client = StreamClient::new(config.upstream.client_config())?;
        state = state.with_api(stream_client.api().clone());
        let (handle, rx) = stream_client.connect();
        state = state.with_connection(handle.status());
        info!(
            api_url = %config.upstream.api_url,
            stream_url = %config.upstream.stream_url,
            "Upstream client started"
        );
        client = Some(handle);
        updates = Some(rx);
    } else {
        warn!("Upstream disabled, serving placeholder frame only");
    }
    let state = Arc::new(state);

    let (shutdown, _) = watch::channel(false);

    let ingest = updates.map(|rx| tokio::spawn(run_ingest(Arc::clone(&state), rx)));
    let render = tokio::spawn(run_render_loop(Arc::clone(&state), shutdown.subscribe()));

    let mut stop = shutdown.subscribe();
    let server_state = Arc::clone(&state);
    let server = tokio::spawn(async move {
        let signal = async move {
            // Resolves on shutdown or when the sender is dropped.
            let _ = stop.changed().await;
        };
        if let Err(e) = start_server(&server_config, server_state, signal).await {
            error!(error = %e, "Dashboard server exited with error");
        }
    });

    info!(%addr, "Dashboard spawned on background tasks");

    Ok(Services {
        state,
        shutdown,
        client,
        ingest,
        render,
        server,
    })
}

impl Services {
    /// Stop everything: signal shutdown, disconnect the client, and wait
    /// for every task to finish.
    pub async fn shutdown(self) {
        // Send fails only when every receiver is already gone.
        let _ = self.shutdown.send(true);

        if let Some(client) = self.client {
            if let Err(e) = client.disconnect().await {
                warn!(error = %e, "Upstream client did not stop cleanly");
            }
        }
        let tasks = [
            ("ingest", self.ingest),
            ("render", Some(self.render)),
            ("server", Some(self.server)),
        ];
        for (name, task) in tasks {
            let Some(task) = task else { continue };
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "Background task failed");
            }
        }
        info!("Dashboard stopped");
    }
}
