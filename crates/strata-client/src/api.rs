//! Request/response access to the simulation backend.
//!
//! # Upstream endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/districts` | District list |
//! | `GET` | `/api/agents` | Agent list |
//! | `GET` | `/api/events` | Event log |
//! | `GET` | `/api/causality` | Causal links |
//! | `GET` | `/api/emotions` | Emotion readings |
//! | `GET` | `/api/rules` | Rules |
//! | `GET` | `/api/status` | Run status |
//! | `POST` | `/api/control/{pause,resume,speed}` | Control commands |

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strata_types::{ControlCommand, SimulationStatus, Snapshot};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::normalize::{normalize_list, normalize_status};

/// HTTP client for the simulation backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SimulationApi {
    client: reqwest::Client,
    base_url: String,
}

impl SimulationApi {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(format!("{url}: {e}")))
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, ClientError> {
        let payload = self.get_json(&format!("/api/{collection}")).await?;
        Ok(normalize_list(payload, collection))
    }

    /// `GET /api/districts`.
    pub async fn fetch_districts(&self) -> Result<Vec<strata_types::District>, ClientError> {
        self.fetch_list("districts").await
    }

    /// `GET /api/agents`.
    pub async fn fetch_agents(&self) -> Result<Vec<strata_types::Agent>, ClientError> {
        self.fetch_list("agents").await
    }

    /// `GET /api/events`.
    pub async fn fetch_events(&self) -> Result<Vec<strata_types::SimulationEvent>, ClientError> {
        self.fetch_list("events").await
    }

    /// `GET /api/causality`.
    pub async fn fetch_causality(&self) -> Result<Vec<strata_types::CausalLink>, ClientError> {
        self.fetch_list("causality").await
    }

    /// `GET /api/emotions`.
    pub async fn fetch_emotions(&self) -> Result<Vec<strata_types::EmotionReading>, ClientError> {
        self.fetch_list("emotions").await
    }

    /// `GET /api/rules`.
    pub async fn fetch_rules(&self) -> Result<Vec<strata_types::Rule>, ClientError> {
        self.fetch_list("rules").await
    }

    /// `GET /api/status`.
    pub async fn fetch_status(&self) -> Result<Option<SimulationStatus>, ClientError> {
        Ok(normalize_status(self.get_json("/api/status").await?))
    }

    /// Fetch every collection concurrently.
    ///
    /// Districts and agents are required; a failure on any panel
    /// collection is logged and that panel left `None`, so applying the
    /// snapshot keeps its previous value.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, ClientError> {
        let (districts, agents, events, causality, emotions, rules, status) = tokio::join!(
            self.fetch_districts(),
            self.fetch_agents(),
            self.fetch_events(),
            self.fetch_causality(),
            self.fetch_emotions(),
            self.fetch_rules(),
            self.fetch_status(),
        );
        let data = Snapshot {
            districts: districts?,
            agents: agents?,
            events: optional(events, "events"),
            causality: optional(causality, "causality"),
            emotions: optional(emotions, "emotions"),
            rules: optional(rules, "rules"),
            status: optional(status, "status").flatten(),
        };
        debug!(
            districts = data.districts.len(),
            agents = data.agents.len(),
            "Fetched full snapshot"
        );
        Ok(data)
    }

    /// Forward a control command. Returns the backend's JSON reply, or
    /// `null` when the reply has no JSON body.
    pub async fn send_command(&self, command: ControlCommand) -> Result<Value, ClientError> {
        let url = self.url(&format!("/api/control/{}", command.path()));
        let request = self.client.post(&url);
        let request = match command {
            ControlCommand::SetSpeed { speed } => request.json(&serde_json::json!({ "speed": speed })),
            ControlCommand::Pause | ControlCommand::Resume => request,
        };
        let response = request.send().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

fn optional<T>(result: Result<T, ClientError>, collection: &str) -> Option<T> {
    result
        .map_err(|e| warn!(collection, error = %e, "Panel collection unavailable"))
        .ok()
}
