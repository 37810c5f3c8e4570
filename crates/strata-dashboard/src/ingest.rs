//! Merges upstream updates into the shared state.
//!
//! Panel-only updates (events, causality, emotions, rules, status) are
//! stored and nothing else happens. Updates that change districts or
//! agents hand the new render inputs to the controller and wake the render
//! loop.

use std::sync::Arc;

use strata_types::SnapshotUpdate;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::state::AppState;

/// Apply one update. Returns `true` when a new frame was requested.
pub async fn apply_update(state: &AppState, update: SnapshotUpdate) -> bool {
    let kind = update.kind();
    let inputs = {
        let mut data = state.data.write().await;
        if !data.apply(update) {
            trace!(kind, "Update stored, render inputs unchanged");
            return false;
        }
        (data.districts.clone(), data.agents.clone())
    };

    let (districts, agents) = inputs;
    debug!(
        kind,
        districts = districts.len(),
        agents = agents.len(),
        "Render inputs changed"
    );
    state.controller.lock().await.update_data(districts, agents);
    state.wake_renderer();
    true
}

/// Drain the client's update channel until it closes.
pub async fn run_ingest(state: Arc<AppState>, mut updates: mpsc::Receiver<SnapshotUpdate>) {
    let mut applied: u64 = 0;
    while let Some(update) = updates.recv().await {
        apply_update(&state, update).await;
        applied = applied.saturating_add(1);
    }
    info!(applied, "Update channel closed, ingest stopped");
}

#[cfg(test)]
mod tests {
    use strata_render::{RenderOptions, RenderState};
    use strata_types::{Agent, District, SimulationEvent};

    use super::*;

    fn districts() -> Vec<District> {
        vec![District::new("n", "North", 0.3), District::new("s", "South", 0.8)]
    }

    #[tokio::test]
    async fn panel_updates_do_not_touch_the_controller() {
        let state = AppState::new(RenderOptions::default());
        let update = SnapshotUpdate::Events(vec![SimulationEvent::default()]);
        let requested = apply_update(&state, update).await;
        assert!(!requested);
        assert_eq!(state.data.read().await.events.len(), 1);
        assert!(!state.controller.lock().await.status().pending);
    }

    #[tokio::test]
    async fn district_updates_reach_the_controller_once() {
        let state = AppState::new(RenderOptions::default());
        assert!(apply_update(&state, SnapshotUpdate::Districts(districts())).await);
        assert!(state.controller.lock().await.status().pending);

        // Identical content does not request another frame.
        assert!(!apply_update(&state, SnapshotUpdate::Districts(districts())).await);
    }

    #[tokio::test]
    async fn single_district_update_keeps_the_terrain() {
        let state = AppState::new(RenderOptions::default());
        apply_update(&state, SnapshotUpdate::Districts(districts())).await;

        let hotter = District::new("s", "South", 0.95);
        assert!(apply_update(&state, SnapshotUpdate::UpsertDistrict(Box::new(hotter))).await);
        let data = state.data.read().await;
        assert_eq!(data.districts.len(), 2);
        let tension = data.districts.get(1).and_then(|d| d.tension);
        assert!(tension.is_some_and(|t| (t - 0.95).abs() < 1e-9));
    }

    #[tokio::test]
    async fn ingest_drains_until_the_channel_closes() {
        let state = Arc::new(AppState::new(RenderOptions::default()));
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(run_ingest(Arc::clone(&state), rx));

        tx.send(SnapshotUpdate::Districts(districts())).await.ok();
        tx.send(SnapshotUpdate::Agents(vec![Agent::new("a1", "n")])).await.ok();
        drop(tx);
        assert!(task.await.is_ok());

        let data = state.data.read().await;
        assert_eq!(data.districts.len(), 2);
        assert_eq!(data.agents.len(), 1);
        let controller = state.controller.lock().await;
        assert_eq!(controller.state(), RenderState::Placeholder);
        assert!(controller.status().pending);
    }
}
