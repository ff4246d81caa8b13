//! Launch the remote digitizer over ssh.

use crate::config::{CaptureConfig, DigitizerConfig};
use anyhow::{ensure, Context, Result};
use digdar_protocol::start_command;
use tokio::process::Command;
use tracing::info;

/// Run the digitizer start command on the remote host.
///
/// The remote command kills any previous digitizer instance and backgrounds
/// the new one, so this returns as soon as ssh does. Failure is not fatal to
/// the daemon; the orchestrator may start the digitizer instead.
pub async fn start_remote(dig: &DigitizerConfig, config: &CaptureConfig) -> Result<()> {
    let command = start_command(
        &dig.binary,
        config.decim,
        config.samples_per_pulse,
        config.max_pulses,
        &dig.stream_dest,
        config.mode,
    );
    info!(host = %dig.host, %command, "starting remote digitizer");

    let status = Command::new("ssh")
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg(format!("{}@{}", dig.user, dig.host))
        .arg(&command)
        .status()
        .await
        .with_context(|| format!("failed to run ssh to {}", dig.host))?;
    ensure!(status.success(), "digitizer start command exited with {status}");
    Ok(())
}
