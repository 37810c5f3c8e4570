//! The long-running upstream client.
//!
//! [`StreamClient::connect`] spawns one task that fetches a full snapshot
//! over REST, then follows the push stream, reconnecting with backoff and
//! falling back to REST polling per [`ConnectionMachine`]. Decoded updates
//! are sent through an `mpsc` channel; connection state is published on a
//! `watch` channel. [`ClientHandle::disconnect`] stops the task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use strata_types::SnapshotUpdate;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::api::SimulationApi;
use crate::connection::{BackoffPolicy, ConnectionMachine, ConnectionStatus};
use crate::error::ClientError;
use crate::message::parse_message;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST base URL.
    pub api_url: String,
    /// Push stream URL (`ws://` or `wss://`).
    pub stream_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Stream reconnect backoff.
    pub backoff: BackoffPolicy,
    /// Consecutive stream failures before polling.
    pub max_stream_attempts: u32,
    /// Polls between stream retries while polling.
    pub stream_retry_polls: u32,
    /// Interval between fallback polls.
    pub poll_interval: Duration,
    /// Capacity of the update channel.
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_owned(),
            stream_url: "ws://localhost:8000/ws".to_owned(),
            request_timeout: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
            max_stream_attempts: 5,
            stream_retry_polls: 10,
            poll_interval: Duration::from_secs(2),
            channel_capacity: 64,
        }
    }
}

/// Connection status plus traffic counters.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    /// Current state.
    pub status: ConnectionStatus,
    /// Stream URL.
    pub stream_url: String,
    /// Updates delivered since start (stream and polling).
    pub updates_received: u64,
    /// Fallback polls performed since start.
    pub polls: u64,
    /// When the last update was delivered.
    pub last_update_at: Option<DateTime<Utc>>,
}

impl ConnectionReport {
    /// Initial report for a client that has not started.
    pub fn idle(stream_url: &str) -> Self {
        Self {
            status: ConnectionStatus::Idle,
            stream_url: stream_url.to_owned(),
            updates_received: 0,
            polls: 0,
            last_update_at: None,
        }
    }
}

/// An explicitly constructed, not yet running upstream client.
#[derive(Debug)]
pub struct StreamClient {
    config: ClientConfig,
    api: SimulationApi,
}

impl StreamClient {
    /// Build the client. Nothing connects until [`connect`](Self::connect).
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = SimulationApi::new(&config.api_url, config.request_timeout)?;
        Ok(Self { config, api })
    }

    /// REST access sharing this client's HTTP pool.
    pub const fn api(&self) -> &SimulationApi {
        &self.api
    }

    /// Spawn the client task.
    ///
    /// Returns the lifecycle handle and the receiving end of the update
    /// channel. The task ends on [`ClientHandle::disconnect`], when the
    /// handle is dropped, or when the receiver is dropped.
    pub fn connect(self) -> (ClientHandle, mpsc::Receiver<SnapshotUpdate>) {
        let (updates_tx, updates_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (report_tx, report_rx) = watch::channel(ConnectionReport::idle(&self.config.stream_url));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            config: self.config,
            api: self.api,
            updates: updates_tx,
            report: report_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(worker.run());

        let handle = ClientHandle {
            report: report_rx,
            shutdown: shutdown_tx,
            task,
        };
        (handle, updates_rx)
    }
}

/// Lifecycle handle for a running client.
#[derive(Debug)]
pub struct ClientHandle {
    report: watch::Receiver<ConnectionReport>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// Subscribe to connection reports.
    pub fn status(&self) -> watch::Receiver<ConnectionReport> {
        self.report.clone()
    }

    /// Signal shutdown and wait for the task to finish.
    pub async fn disconnect(self) -> Result<(), ClientError> {
        // Send fails only when the task already exited.
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| ClientError::Shutdown(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Worker task
// ---------------------------------------------------------------------------

enum SessionEnd {
    Shutdown,
    Dropped(String),
}

struct Worker {
    config: ClientConfig,
    api: SimulationApi,
    updates: mpsc::Sender<SnapshotUpdate>,
    report: watch::Sender<ConnectionReport>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        let mut machine = ConnectionMachine::new(
            self.config.backoff,
            self.config.max_stream_attempts,
            self.config.stream_retry_polls,
        );

        match self.api.fetch_snapshot().await {
            Ok(data) => {
                if !self.deliver(SnapshotUpdate::Full(Box::new(data))).await {
                    return self.finish(&mut machine);
                }
            }
            Err(e) => warn!(error = %e, "Initial snapshot fetch failed"),
        }

        machine.start();
        loop {
            if self.stopping() {
                break;
            }
            self.publish(machine.status());
            match machine.status() {
                ConnectionStatus::Idle => machine.start(),
                ConnectionStatus::Connecting { attempt } => {
                    debug!(url = %self.config.stream_url, attempt, "Connecting to simulation stream");
                    let connected = tokio::select! {
                        _ = self.shutdown.changed() => break,
                        result = connect_async(self.config.stream_url.as_str()) => result,
                    };
                    match connected {
                        Ok((socket, _)) => {
                            machine.on_connected();
                            self.publish(machine.status());
                            info!(url = %self.config.stream_url, "Simulation stream connected");
                            match self.session(socket).await {
                                SessionEnd::Shutdown => break,
                                SessionEnd::Dropped(reason) => {
                                    warn!(reason = %reason, "Simulation stream dropped");
                                    machine.on_disconnected();
                                }
                            }
                        }
                        Err(e) => {
                            let error = ClientError::Stream(e.to_string());
                            warn!(attempt, error = %error, "Simulation stream connect failed");
                            machine.on_failure();
                            if matches!(machine.status(), ConnectionStatus::PollingFallback { .. }) {
                                info!("Falling back to REST polling");
                            }
                        }
                    }
                }
                ConnectionStatus::Reconnecting { delay_ms, .. } => {
                    if !self.sleep(Duration::from_millis(delay_ms)).await {
                        break;
                    }
                    machine.on_delay_elapsed();
                }
                ConnectionStatus::PollingFallback { .. } => {
                    if !self.sleep(self.config.poll_interval).await {
                        break;
                    }
                    self.report.send_modify(|r| r.polls = r.polls.saturating_add(1));
                    match self.api.fetch_snapshot().await {
                        Ok(data) => {
                            if !self.deliver(SnapshotUpdate::Full(Box::new(data))).await {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Fallback poll failed"),
                    }
                    machine.on_poll();
                }
                ConnectionStatus::Connected | ConnectionStatus::Closed => break,
            }
        }
        self.finish(&mut machine);
    }

    async fn session(&mut self, mut socket: Socket) -> SessionEnd {
        loop {
            let message = tokio::select! {
                _ = self.shutdown.changed() => {
                    // Best effort; the server may already be gone.
                    let _ = socket.close(None).await;
                    return SessionEnd::Shutdown;
                }
                message = socket.next() => message,
            };
            match message {
                Some(Ok(Message::Text(text))) => match parse_message(text.as_str()) {
                    Ok(Some(update)) => {
                        if !self.deliver(update).await {
                            let _ = socket.close(None).await;
                            return SessionEnd::Shutdown;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Dropping undecodable stream message"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Dropped("closed by server".to_owned());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
            }
        }
    }

    /// Send an update downstream. `false` when the receiver is gone.
    async fn deliver(&self, update: SnapshotUpdate) -> bool {
        debug!(kind = update.kind(), "Delivering update");
        if self.updates.send(update).await.is_err() {
            debug!("Update receiver dropped, stopping client");
            return false;
        }
        self.report.send_modify(|r| {
            r.updates_received = r.updates_received.saturating_add(1);
            r.last_update_at = Some(Utc::now());
        });
        true
    }

    /// Sleep unless shutdown arrives first. `false` on shutdown.
    async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.changed() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }

    fn stopping(&self) -> bool {
        *self.shutdown.borrow() || self.updates.is_closed()
    }

    fn publish(&self, status: ConnectionStatus) {
        self.report.send_if_modified(|r| {
            if r.status == status {
                return false;
            }
            r.status = status;
            true
        });
    }

    fn finish(&self, machine: &mut ConnectionMachine) {
        machine.close();
        self.publish(machine.status());
        info!("Simulation client stopped");
    }
}
