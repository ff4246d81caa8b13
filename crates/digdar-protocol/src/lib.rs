//! Wire formats spoken between the capture daemon and the digdar digitizer.
//!
//! Three independent surfaces live here:
//!
//! - [`pulse`]: the fixed-length binary pulse record the digitizer streams
//!   over TCP, and an incremental [`PulseDecoder`] for it
//! - [`message`]: the JSON notification datagrams sent to the local
//!   orchestrator (`captureReady` / `sweepReady`)
//! - [`digitizer`]: the remote shell command that starts the digitizer and
//!   points it at our listen socket
//!
//! Nothing in this crate does I/O; it only defines layouts and encodes or
//! decodes byte buffers, so every piece is testable with plain byte slices.

pub mod digitizer;
pub mod message;
pub mod pulse;

pub use digitizer::{start_command, DecimMode};
pub use message::Notification;
pub use pulse::{Pulse, PulseDecoder, BYTES_PER_SAMPLE, PULSE_HEADER_SIZE};
