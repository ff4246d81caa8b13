//! Background publisher task.
//!
//! Receives finalized sweeps from the capture loop one at a time, serializes
//! them to the staging path, renames them into place, and sends the
//! `sweepReady` notification. The buffer goes back to the capture loop
//! whether publishing succeeded or not; a failed publish drops that one
//! sweep, nothing more.

use crate::notify::Notifier;
use digdar_pool::SweepBuffer;
use digdar_storage::write_sweep;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Run the publisher until the work channel closes.
pub async fn run(
    mut work: mpsc::Receiver<SweepBuffer>,
    done: mpsc::Sender<SweepBuffer>,
    staging: PathBuf,
    canonical: PathBuf,
    notifier: Notifier,
) {
    while let Some(sweep) = work.recv().await {
        match write_sweep(&sweep, &staging, &canonical).await {
            Ok(()) => {
                info!(
                    sweep_id = sweep.sweep_id(),
                    np = sweep.meta.np,
                    ts0 = sweep.meta.ts0,
                    degraded = sweep.meta.degraded,
                    path = %canonical.display(),
                    "sweep published"
                );
                notifier.sweep_ready(&canonical).await;
            }
            Err(err) => {
                warn!(
                    sweep_id = sweep.sweep_id(),
                    np = sweep.meta.np,
                    "dropping sweep, publish failed: {err:#}"
                );
            }
        }
        if done.send(sweep).await.is_err() {
            // Capture loop is gone; nothing left to return buffers to.
            return;
        }
    }
}
