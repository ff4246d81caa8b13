//! Sweep file storage.
//!
//! A sweep file is a one-line magic string, a one-line JSON metadata record,
//! alignment padding, and four binary sections:
//!
//! ```text
//! DigDar radar sweep file\n
//! {"version":"1.0.0",...}\n
//! [0..7 spaces so the payload starts 8-byte aligned]
//! clocks    np x u32 LE
//! azimuths  np x f32 LE
//! trigs     np x u32 LE
//! samples   np x ns x bps bytes
//! ```
//!
//! The writer targets a staging path and atomically renames the finished file
//! into place, so a reader holding the previous file open keeps a complete,
//! consistent view. The reader parses the same format back for verification
//! and downstream tooling.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{encode_header, padding_for, MAGIC};
pub use reader::{read_sweep, SweepFile};
pub use writer::write_sweep;
