//! Error types for the upstream client.

/// Errors raised while talking to the simulation backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request could not be sent or its body not read.
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("upstream returned {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The push stream failed to connect or broke.
    #[error("stream error: {0}")]
    Stream(String),

    /// A payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client task ended abnormally during shutdown.
    #[error("client shutdown failed: {0}")]
    Shutdown(String),
}
