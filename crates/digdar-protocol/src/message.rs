//! Notification datagrams sent to the local orchestrator.
//!
//! The capture daemon announces itself and each published sweep with a small
//! JSON datagram on a local UDP port. Delivery is best-effort: no
//! acknowledgement, no retry. Losing one costs the consumer a little
//! timeliness, never sweep integrity.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Event carried by a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyEvent {
    /// The daemon is listening and ready for the digitizer to connect.
    CaptureReady,
    /// A sweep file has been renamed into place at `path`.
    SweepReady,
}

/// One notification datagram: `{"event":"sweepReady","path":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub event: NotifyEvent,
    /// Canonical sweep path, present for `sweepReady` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Notification {
    /// Notification that the listener is up.
    #[must_use]
    pub fn capture_ready() -> Self {
        Self {
            event: NotifyEvent::CaptureReady,
            path: None,
        }
    }

    /// Notification that a sweep is available at `path`.
    #[must_use]
    pub fn sweep_ready(path: &Path) -> Self {
        Self {
            event: NotifyEvent::SweepReady,
            path: Some(path.to_path_buf()),
        }
    }

    /// Encode as a JSON datagram body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
