//! Configuration loading for the capture daemon.
//!
//! Configuration is loaded from:
//! 1. a TOML file (`digdar.toml` by default, `--config` to override)
//! 2. environment variables prefixed with `DIGDAR_`
//!
//! Every field has a default matching the reference deployment, so an empty
//! configuration yields a working daemon:
//!
//! ```text
//! DIGDAR_LISTEN_PORT=12346
//! DIGDAR_MAX_PULSES=4000
//! DIGDAR_SITE=csh
//! ```

use digdar_pool::{SweepParams, MIN_POOL_SIZE};
use digdar_protocol::DecimMode;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("configuration validation error: {0}")]
    Validation(String),
}

/// Complete daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Short human-readable site label.
    #[serde(default = "default_site")]
    pub site: String,
    /// TCP port to listen on for the digitizer connection (0 = ephemeral).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Path the sweep file is written to while being serialized.
    #[serde(default = "default_staging_path")]
    pub staging_path: PathBuf,
    /// Path the finished sweep file is renamed to.
    #[serde(default = "default_canonical_path")]
    pub canonical_path: PathBuf,
    /// Maximum pulses buffered per sweep.
    #[serde(default = "default_max_pulses")]
    pub max_pulses: usize,
    /// Samples digitized per pulse; must match the digitizer's `-n` option.
    #[serde(default = "default_samples_per_pulse")]
    pub samples_per_pulse: usize,
    /// Number of sweep buffers to pre-allocate (minimum 3).
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Sample decimation factor (1 = every sample).
    #[serde(default = "default_decim")]
    pub decim: u32,
    /// Decimation mode.
    #[serde(default = "default_mode")]
    pub mode: DecimMode,
    /// Digitizer clock rate, in MHz.
    #[serde(default = "default_clock_mhz")]
    pub clock_mhz: f64,
    /// Nominal ACP count per antenna rotation.
    #[serde(default = "default_acps")]
    pub acps: u32,
    /// Local UDP address notification datagrams are sent to.
    #[serde(default = "default_notify_addr")]
    pub notify_addr: SocketAddr,
    /// Remote digitizer to start over ssh; `None` leaves that to the
    /// orchestrator.
    #[serde(default)]
    pub digitizer: Option<DigitizerConfig>,
}

/// Remote digitizer launch parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitizerConfig {
    /// ssh user on the digitizer host.
    pub user: String,
    /// Digitizer hostname or address.
    pub host: String,
    /// Path of the digitizer binary on the remote host.
    #[serde(default = "default_digitizer_binary")]
    pub binary: String,
    /// `host:port` the digitizer should stream to, as seen from the
    /// digitizer's side of the network.
    pub stream_dest: String,
}

fn default_site() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "radar".to_string())
}

fn default_listen_port() -> u16 {
    12345
}

fn default_staging_path() -> PathBuf {
    PathBuf::from("/dev/shm/new_sweep.dat")
}

fn default_canonical_path() -> PathBuf {
    PathBuf::from("/dev/shm/sweep.dat")
}

fn default_max_pulses() -> usize {
    5300
}

fn default_samples_per_pulse() -> usize {
    4000
}

fn default_pool_size() -> usize {
    5
}

fn default_decim() -> u32 {
    1
}

fn default_mode() -> DecimMode {
    DecimMode::Sum
}

fn default_clock_mhz() -> f64 {
    125.0
}

fn default_acps() -> u32 {
    450
}

fn default_notify_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 59000))
}

fn default_digitizer_binary() -> String {
    "/opt/bin/digdar".to_string()
}

impl CaptureConfig {
    /// Load configuration from the TOML file at `path` (or `digdar.toml` in
    /// the working directory) plus `DIGDAR_`-prefixed environment overrides,
    /// then validate it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new("digdar.toml"));
        let config: Self = Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed("DIGDAR_"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the capture loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size < MIN_POOL_SIZE {
            return Err(ConfigError::Validation(format!(
                "pool_size must be at least {MIN_POOL_SIZE} (got {})",
                self.pool_size
            )));
        }
        if self.max_pulses == 0 {
            return Err(ConfigError::Validation("max_pulses must be positive".into()));
        }
        if self.samples_per_pulse == 0 {
            return Err(ConfigError::Validation(
                "samples_per_pulse must be positive".into(),
            ));
        }
        if self.acps == 0 {
            return Err(ConfigError::Validation("acps must be positive".into()));
        }
        if self.clock_mhz <= 0.0 {
            return Err(ConfigError::Validation(
                "clock_mhz must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Buffer geometry derived from this configuration.
    #[must_use]
    pub fn sweep_params(&self) -> SweepParams {
        SweepParams {
            max_pulses: self.max_pulses,
            samples_per_pulse: self.samples_per_pulse,
            site: self.site.clone(),
            clock_mhz: self.clock_mhz,
            decim: self.decim,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config: CaptureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.listen_port, 12345);
        assert_eq!(config.max_pulses, 5300);
        assert_eq!(config.samples_per_pulse, 4000);
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.decim, 1);
        assert_eq!(config.mode, DecimMode::Sum);
        assert_eq!(config.clock_mhz, 125.0);
        assert_eq!(config.acps, 450);
        assert_eq!(config.canonical_path, PathBuf::from("/dev/shm/sweep.dat"));
        assert!(config.digitizer.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_undersized_pool_is_rejected() {
        let mut config: CaptureConfig = serde_json::from_str("{}").unwrap();
        config.pool_size = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_zero_geometry_is_rejected() {
        let mut config: CaptureConfig = serde_json::from_str("{}").unwrap();
        config.samples_per_pulse = 0;
        assert!(config.validate().is_err());
    }
}
