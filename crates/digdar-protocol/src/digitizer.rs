//! Remote start command for the digdar digitizer.
//!
//! The digitizer runs on the Red Pitaya and is told where to stream via a
//! one-shot remote shell command. Any previous instance is killed first, and
//! the new one is backgrounded so the ssh session returns immediately.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample decimation mode applied on the digitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimMode {
    /// Keep the first sample of each decimation chunk.
    First,
    /// Sum the samples of each decimation chunk.
    Sum,
}

impl fmt::Display for DecimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimMode::First => write!(f, "first"),
            DecimMode::Sum => write!(f, "sum"),
        }
    }
}

/// Build the remote shell command that (re)starts the digitizer.
///
/// `stream_dest` is the `host:port` the digitizer should stream pulses to,
/// i.e. the capture daemon's listen socket as seen from the digitizer. The sample
/// count per pulse must match the daemon's `samples_per_pulse`, otherwise the
/// fixed record framing breaks.
#[must_use]
pub fn start_command(
    binary: &str,
    decim: u32,
    samples_per_pulse: usize,
    max_pulses: usize,
    stream_dest: &str,
    mode: DecimMode,
) -> String {
    let name = binary.rsplit('/').next().unwrap_or(binary);
    let sum = match mode {
        DecimMode::Sum => " --sum",
        DecimMode::First => "",
    };
    format!(
        "killall -KILL {name}; {binary} -d {decim} -n {samples_per_pulse} -p {max_pulses} \
         --tcp {stream_dest}{sum} &"
    )
}
