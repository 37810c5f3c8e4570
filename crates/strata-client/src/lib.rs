//! Upstream client for the Strata simulation dashboard.
//!
//! Talks to the external simulation backend over two channels:
//!
//! - **REST** ([`SimulationApi`]) for full snapshots and control commands
//! - **Push stream** (`WebSocket`) for incremental updates, decoded by
//!   [`parse_message`]
//!
//! Every payload passes through [`normalize`] so consumers only ever see
//! canonical lists. [`StreamClient`] ties it together: initial REST
//! snapshot, then the stream with exponential backoff, then REST polling
//! when the stream stays down.

pub mod api;
pub mod client;
pub mod connection;
pub mod error;
pub mod message;
pub mod normalize;

pub use api::SimulationApi;
pub use client::{ClientConfig, ClientHandle, ConnectionReport, StreamClient};
pub use connection::{BackoffPolicy, ConnectionMachine, ConnectionStatus};
pub use error::ClientError;
pub use message::parse_message;
