//! Async driver for the render controller.
//!
//! Recomposes when inputs or options changed, never faster than the
//! configured frame rate, and only on the latest inputs. The loop sleeps
//! on three things: shutdown, a wake from ingest or the control
//! endpoints, and the rate-cap deadline reported by the controller.

use std::sync::Arc;
use std::time::Instant;

use strata_render::Schedule;
use tokio::sync::watch;
use tracing::{info, trace};

use crate::state::AppState;

/// Run until `shutdown` flips to `true` or its sender is dropped, then
/// tear the controller down.
pub async fn run_render_loop(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
    info!("Render loop started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        let schedule = state.controller.lock().await.schedule();
        match schedule {
            Schedule::Now => {
                render_pass(&state).await;
            }
            Schedule::At(deadline) => {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    () = state.woken() => {}
                    () = tokio::time::sleep_until(deadline.into()) => {
                        render_pass(&state).await;
                    }
                }
            }
            Schedule::Idle => {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    () = state.woken() => {}
                }
            }
        }
    }
    state.controller.lock().await.teardown();
    info!("Render loop stopped");
}

/// Poll the controller once and publish the frame it produced, if any.
/// Returns whether a frame was published.
pub async fn render_pass(state: &AppState) -> bool {
    let frame = state.controller.lock().await.poll(Instant::now());
    let Some(frame) = frame else {
        return false;
    };
    trace!(
        width = frame.width,
        height = frame.height,
        visible_agents = frame.stats.visible_agents,
        "Frame published"
    );
    state.publish_frame(frame);
    true
}
