//! Sweep buffer: one antenna rotation's worth of pulses.
//!
//! Designed for zero-allocation reuse:
//! - Fixed-capacity sample buffer and metadata arrays, pre-allocated once
//! - `clear()` is O(1): resets counters, preserves every backing allocation
//! - Per-pulse metadata (`clocks`, `trigs`, `azimuths`) kept in lock-step
//!   with the sample bytes
//!
//! A buffer is exclusively owned by exactly one of the assembler (while
//! filling), the publisher (while serializing), or the pool (while free);
//! ownership moves, it is never shared.

use digdar_protocol::{DecimMode, Pulse, BYTES_PER_SAMPLE};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone id assigned to each buffer slot at creation, for diagnostics.
static NEXT_SWEEP_ID: AtomicU64 = AtomicU64::new(1);

/// File format version written into sweep metadata.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Geometry and site parameters shared by every buffer in a pool.
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Maximum pulses buffered per sweep.
    pub max_pulses: usize,
    /// Samples digitized per pulse.
    pub samples_per_pulse: usize,
    /// Short human-readable site label, prefixed to downstream filenames.
    pub site: String,
    /// Digitizer clock rate, in MHz.
    pub clock_mhz: f64,
    /// Sample decimation factor (1 = every sample).
    pub decim: u32,
    /// Decimation mode applied on the digitizer.
    pub mode: DecimMode,
}

/// Sweep-level metadata, serialized as the textual header of a sweep file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepMeta {
    /// File format version.
    pub version: String,
    /// Site label.
    pub site: String,
    /// ARP counter value identifying this rotation; `None` until the first
    /// pulse of the sweep arrives.
    pub arp: Option<u32>,
    /// Number of pulses stored.
    pub np: u32,
    /// Samples per pulse.
    pub ns: u32,
    /// Sample bit depth, as text (e.g. "16").
    pub fmt: String,
    /// Timestamp of the first pulse, seconds since the epoch.
    pub ts0: f64,
    /// Timestamp of the last pulse, seconds since the epoch.
    pub tsn: f64,
    /// Range of the first sample, in meters.
    pub range0: f64,
    /// Digitizer clock rate, in MHz.
    pub clock: f64,
    /// Sample decimation factor.
    pub decim: u32,
    /// Decimation mode.
    pub mode: DecimMode,
    /// Total payload bytes for this sweep.
    pub bytes: u64,
    /// True when the sweep was force-finalized on overflow or its azimuths
    /// could not be fully corrected.
    pub degraded: bool,
}

impl SweepMeta {
    fn new(params: &SweepParams) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            site: params.site.clone(),
            arp: None,
            np: 0,
            ns: params.samples_per_pulse as u32,
            fmt: (8 * BYTES_PER_SAMPLE).to_string(),
            ts0: 0.0,
            tsn: 0.0,
            range0: 0.0,
            clock: params.clock_mhz,
            decim: params.decim,
            mode: params.mode,
            bytes: 0,
            degraded: false,
        }
    }
}

/// A reusable, fixed-capacity container for one sweep.
#[derive(Debug)]
pub struct SweepBuffer {
    /// Sweep-level metadata; `meta.np` counts the pulses stored so far.
    pub meta: SweepMeta,
    /// Trigger clock per pulse.
    pub clocks: Vec<u32>,
    /// Azimuth per pulse: raw ACP counts until corrected, then fraction of a
    /// rotation in [0, 1).
    pub azimuths: Vec<f32>,
    /// Trigger pulse counter per pulse.
    pub trigs: Vec<u32>,
    /// Raw sample bytes, `max_pulses * ns * bps` capacity.
    pub samples: Vec<u8>,
    max_pulses: usize,
    ns: usize,
    bps: usize,
    sweep_id: u64,
}

impl SweepBuffer {
    /// Allocate a buffer for `params.max_pulses` pulses. All backing storage
    /// is allocated here, once, and reused for the life of the process.
    #[must_use]
    pub fn new(params: &SweepParams) -> Self {
        let max_pulses = params.max_pulses;
        let ns = params.samples_per_pulse;
        Self {
            meta: SweepMeta::new(params),
            clocks: vec![0; max_pulses],
            azimuths: vec![0.0; max_pulses],
            trigs: vec![0; max_pulses],
            samples: vec![0; max_pulses * ns * BYTES_PER_SAMPLE],
            max_pulses,
            ns,
            bps: BYTES_PER_SAMPLE,
            sweep_id: NEXT_SWEEP_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Slot id, stable across reuse. Diagnostics only.
    #[must_use]
    pub fn sweep_id(&self) -> u64 {
        self.sweep_id
    }

    /// Pulse capacity.
    #[must_use]
    pub fn max_pulses(&self) -> usize {
        self.max_pulses
    }

    /// Samples per pulse.
    #[must_use]
    pub fn ns(&self) -> usize {
        self.ns
    }

    /// Bytes per sample.
    #[must_use]
    pub fn bps(&self) -> usize {
        self.bps
    }

    /// True once `max_pulses` pulses are stored.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.meta.np as usize == self.max_pulses
    }

    /// Append one pulse's metadata and sample bytes at index `np`.
    ///
    /// # Panics
    /// Panics if the buffer is full or the payload length does not match the
    /// configured record geometry; the assembler rotates buffers before
    /// either can happen.
    pub fn append(&mut self, pulse: &Pulse) {
        let np = self.meta.np as usize;
        assert!(np < self.max_pulses, "sweep buffer overrun");
        let stride = self.ns * self.bps;
        assert_eq!(
            pulse.samples.len(),
            stride,
            "pulse payload does not match record geometry"
        );
        self.clocks[np] = pulse.trig_clock;
        self.trigs[np] = pulse.num_trig;
        self.azimuths[np] = pulse.acp_clock;
        self.samples[np * stride..(np + 1) * stride].copy_from_slice(&pulse.samples);
        self.meta.np += 1;
    }

    /// Make the sweep look empty again. O(1): the backing storage is kept.
    pub fn clear(&mut self) {
        self.meta.arp = None;
        self.meta.np = 0;
        self.meta.bytes = 0;
        self.meta.ts0 = 0.0;
        self.meta.tsn = 0.0;
        self.meta.degraded = false;
    }

    /// Trigger clocks of the stored pulses.
    #[inline]
    #[must_use]
    pub fn clock_data(&self) -> &[u32] {
        &self.clocks[..self.meta.np as usize]
    }

    /// Azimuths of the stored pulses.
    #[inline]
    #[must_use]
    pub fn azimuth_data(&self) -> &[f32] {
        &self.azimuths[..self.meta.np as usize]
    }

    /// Mutable azimuths, for in-place correction.
    #[inline]
    #[must_use]
    pub fn azimuth_data_mut(&mut self) -> &mut [f32] {
        &mut self.azimuths[..self.meta.np as usize]
    }

    /// Trigger counters of the stored pulses.
    #[inline]
    #[must_use]
    pub fn trig_data(&self) -> &[u32] {
        &self.trigs[..self.meta.np as usize]
    }

    /// Sample bytes of the stored pulses.
    #[inline]
    #[must_use]
    pub fn sample_data(&self) -> &[u8] {
        &self.samples[..self.meta.np as usize * self.ns * self.bps]
    }
}
