//! Sweep assembly state machine.
//!
//! The assembler owns the active write buffer and watches each pulse's ARP
//! counter. A changed counter means the antenna has completed a rotation: the
//! previous sweep is finalized, a fresh buffer is swapped in from the pool,
//! and the triggering pulse opens the new sweep. A sweep that fills its
//! buffer before the ARP changes is force-finalized early and marked
//! degraded rather than overrunning.
//!
//! No I/O happens here, so the whole boundary logic is testable with
//! synthetic pulse sequences.

use digdar_pool::{SweepBuffer, SweepPool};
use digdar_protocol::Pulse;
use tracing::{debug, warn};

/// Assembles decoded pulses into sweeps.
#[derive(Debug)]
pub struct SweepAssembler {
    active: SweepBuffer,
    /// Nanoseconds per digitizer clock tick.
    clock_ns: f64,
    overflows: u64,
}

impl SweepAssembler {
    /// Start assembling into `active`, with timing derived from the
    /// digitizer clock rate in MHz.
    #[must_use]
    pub fn new(active: SweepBuffer, clock_mhz: f64) -> Self {
        Self {
            active,
            clock_ns: 1e9 / (clock_mhz * 1e6),
            overflows: 0,
        }
    }

    /// Feed one pulse through the state machine.
    ///
    /// Returns the previous sweep, finalized, when this pulse closed it;
    /// the pulse itself always ends up appended to the (possibly fresh)
    /// active buffer.
    pub fn ingest(&mut self, pulse: &Pulse, pool: &mut SweepPool) -> Option<SweepBuffer> {
        let mut finalized = None;
        if let Some(arp) = self.active.meta.arp {
            if arp != pulse.num_arp {
                finalized = Some(self.rotate(pool, false));
            } else if self.active.is_full() {
                self.overflows += 1;
                warn!(
                    sweep_id = self.active.sweep_id(),
                    np = self.active.meta.np,
                    overflows = self.overflows,
                    "pulse capacity reached without an ARP transition, force-finalizing"
                );
                finalized = Some(self.rotate(pool, true));
            }
        }
        if self.active.meta.arp.is_none() {
            self.start_sweep(pulse);
        }
        self.active.append(pulse);
        finalized
    }

    /// The buffer currently being filled.
    #[must_use]
    pub fn active(&self) -> &SweepBuffer {
        &self.active
    }

    /// Sweeps force-finalized on overflow so far.
    #[must_use]
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Swap in a fresh buffer and finalize the full one.
    fn rotate(&mut self, pool: &mut SweepPool, degraded: bool) -> SweepBuffer {
        let mut full = std::mem::replace(&mut self.active, pool.acquire_write());
        let np = full.meta.np as usize;
        let clocks = full.clock_data();
        let span = clocks[np - 1].wrapping_sub(clocks[0]);
        full.meta.tsn = full.meta.ts0 + f64::from(span) * self.clock_ns * 1e-9;
        full.meta.bytes = full.meta.np as u64 * (full.ns() * full.bps() + 12) as u64;
        if degraded {
            full.meta.degraded = true;
        }
        full
    }

    /// Record the first pulse of a sweep: its ARP id and start timestamp.
    ///
    /// The trig clock counts digitizer ticks between ARP detection and
    /// trigger detection, so the pulse timestamp is the ARP wall clock plus
    /// that many tick periods.
    fn start_sweep(&mut self, pulse: &Pulse) {
        self.active.meta.arp = Some(pulse.num_arp);
        self.active.meta.ts0 = f64::from(pulse.arp_clock_sec)
            + 1e-9 * (f64::from(pulse.arp_clock_nsec) + self.clock_ns * f64::from(pulse.trig_clock));
        debug!(
            sweep_id = self.active.sweep_id(),
            arp = pulse.num_arp,
            ts0 = self.active.meta.ts0,
            "sweep started"
        );
    }
}
