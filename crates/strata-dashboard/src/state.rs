//! Shared application state for the dashboard.
//!
//! [`AppState`] holds the latest simulation data, the render controller
//! and the published frame. The frame lives in a `watch` channel of
//! `Arc<Frame>`: HTTP handlers and every `WebSocket` client read the newest
//! complete frame without copying it, and a slow reader simply skips
//! intermediate frames.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use strata_client::{ConnectionReport, SimulationApi};
use strata_render::{Frame, RenderController, RenderOptions};
use strata_types::SimulationData;
use tokio::sync::{Mutex, Notify, RwLock, watch};

/// Shared state for the Axum application and the background tasks.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Latest value of every upstream collection.
    pub data: RwLock<SimulationData>,
    /// Render state machine.
    pub controller: Mutex<RenderController>,
    /// Backend access for forwarded control commands.
    pub api: Option<SimulationApi>,
    /// When the dashboard started.
    pub started_at: DateTime<Utc>,
    frames: watch::Sender<Arc<Frame>>,
    wake: Notify,
    connection: Option<watch::Receiver<ConnectionReport>>,
}

impl AppState {
    /// Create state with a mounted controller showing the placeholder
    /// frame. No upstream is attached.
    pub fn new(options: RenderOptions) -> Self {
        let mut controller = RenderController::new(options);
        let initial = controller.mount().unwrap_or_else(|| {
            let options = controller.options();
            Arc::new(Frame::placeholder(options.width, options.height))
        });
        let (frames, _) = watch::channel(initial);
        Self {
            data: RwLock::new(SimulationData::default()),
            controller: Mutex::new(controller),
            api: None,
            started_at: Utc::now(),
            frames,
            wake: Notify::new(),
            connection: None,
        }
    }

    /// Attach backend access for forwarding control commands.
    #[must_use]
    pub fn with_api(mut self, api: SimulationApi) -> Self {
        self.api = Some(api);
        self
    }

    /// Attach the stream client's status channel.
    #[must_use]
    pub fn with_connection(mut self, connection: watch::Receiver<ConnectionReport>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// The newest published frame.
    pub fn current_frame(&self) -> Arc<Frame> {
        Arc::clone(&*self.frames.borrow())
    }

    /// Subscribe to frame publications.
    pub fn subscribe_frames(&self) -> watch::Receiver<Arc<Frame>> {
        self.frames.subscribe()
    }

    /// Publish a new frame to every reader.
    pub fn publish_frame(&self, frame: Arc<Frame>) {
        // send_replace succeeds with zero receivers.
        self.frames.send_replace(frame);
    }

    /// Wake the render loop: inputs or options changed.
    pub fn wake_renderer(&self) {
        self.wake.notify_one();
    }

    /// Resolves on the next [`wake_renderer`](Self::wake_renderer) call, or
    /// immediately if one is pending.
    pub async fn woken(&self) {
        self.wake.notified().await;
    }

    /// Latest stream client report, when a client is attached.
    pub fn connection(&self) -> Option<ConnectionReport> {
        self.connection.as_ref().map(|rx| rx.borrow().clone())
    }
}
