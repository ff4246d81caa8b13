//! Error types for the capture daemon.
//!
//! The taxonomy is deliberately small: configuration problems and pool
//! sizing are fatal at startup, and loss of the digitizer connection is
//! fatal at runtime (the external supervisor restarts the process).
//! Everything else (overflowing sweeps, pool starvation, publish failures,
//! uncorrectable azimuths) is handled in place and never surfaces here.

use crate::config::ConfigError;
use digdar_pool::PoolError;
use thiserror::Error;

/// Convenience alias for results using the daemon error type.
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("sweep pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("digitizer connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
