//! Fixed-capacity sweep buffer pool for zero-allocation pulse ingestion.
//!
//! Every sweep buffer the process will ever use is allocated once, up front;
//! after that the hot ingestion path only moves buffers between three places:
//!
//! - `free`: buffers ready to become the next write target
//! - `pending`: filled buffers queued for serialization, oldest first
//! - checked out: the assembler's active write buffer, or the single buffer
//!   in flight to the publisher
//!
//! # Ownership Model
//!
//! Unlike a lock-based pool, this one relies on the single-owner discipline
//! of the capture path: one task owns the pool and moves whole buffers in and
//! out of it. There are no locks because there is nothing to share.
//!
//! # Backpressure
//!
//! When `free` runs dry (the publisher is slower than the antenna), the pool
//! evicts the *oldest* pending sweep and hands its buffer back to the writer.
//! Bounded memory and continuous ingestion are preferred over guaranteed
//! delivery; every eviction is counted and logged.

pub mod azimuth;
pub mod sweep;

pub use azimuth::{correct, AzimuthQuality};
pub use sweep::{SweepBuffer, SweepMeta, SweepParams, FORMAT_VERSION};

use std::collections::VecDeque;
use thiserror::Error;
use tracing::warn;

/// One buffer filling, one being serialized, one spare to swap in.
pub const MIN_POOL_SIZE: usize = 3;

/// Pool construction errors.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(
        "sweep pool needs at least {MIN_POOL_SIZE} buffers: one being written, \
         one being read, one waiting (got {0})"
    )]
    TooFewBuffers(usize),
}

/// The set of sweep buffers, and the queues they move through.
#[derive(Debug)]
pub struct SweepPool {
    free: VecDeque<SweepBuffer>,
    pending: VecDeque<SweepBuffer>,
    capacity: usize,
    dropped: u64,
    published: u64,
}

impl SweepPool {
    /// Allocate `size` buffers of the given geometry.
    ///
    /// Fewer than [`MIN_POOL_SIZE`] buffers cannot keep ingestion,
    /// serialization, and the swap-in spare alive simultaneously; that is a
    /// fatal configuration error.
    pub fn new(size: usize, params: &SweepParams) -> Result<Self, PoolError> {
        if size < MIN_POOL_SIZE {
            return Err(PoolError::TooFewBuffers(size));
        }
        let free = (0..size).map(|_| SweepBuffer::new(params)).collect();
        Ok(Self {
            free,
            pending: VecDeque::new(),
            capacity: size,
            dropped: 0,
            published: 0,
        })
    }

    /// Take the next buffer to fill.
    ///
    /// Pops from `free`; if `free` is empty, the oldest pending sweep is
    /// sacrificed instead. The caller always gets a cleared buffer without
    /// blocking.
    pub fn acquire_write(&mut self) -> SweepBuffer {
        if let Some(buf) = self.free.pop_front() {
            return buf;
        }
        self.dropped += 1;
        #[allow(clippy::expect_used)]
        let mut oldest = self
            .pending
            .pop_front()
            .expect("pool invariant violated: free and pending both empty");
        warn!(
            sweep_id = oldest.sweep_id(),
            dropped = self.dropped,
            "free pool exhausted, evicting oldest unpublished sweep"
        );
        oldest.clear();
        oldest
    }

    /// Queue a filled buffer for serialization.
    pub fn publish_full(&mut self, buf: SweepBuffer) {
        self.published += 1;
        self.pending.push_back(buf);
    }

    /// Take the oldest pending sweep for serialization, if any. The caller
    /// holds it as the single in-flight read buffer.
    pub fn checkout_read(&mut self) -> Option<SweepBuffer> {
        self.pending.pop_front()
    }

    /// Return a buffer whose sweep has been serialized (or dropped). Content
    /// is cleared; the backing storage is reused.
    pub fn return_free(&mut self, mut buf: SweepBuffer) {
        buf.clear();
        self.free.push_back(buf);
    }

    /// Buffers ready to be filled.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Filled sweeps awaiting serialization.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total buffers owned by the pool, checked-out ones included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sweeps sacrificed to backpressure so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Sweeps queued for serialization so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digdar_protocol::DecimMode;

    fn params() -> SweepParams {
        SweepParams {
            max_pulses: 8,
            samples_per_pulse: 2,
            site: "test".into(),
            clock_mhz: 125.0,
            decim: 1,
            mode: DecimMode::Sum,
        }
    }

    #[test]
    fn test_too_few_buffers_is_fatal() {
        assert!(matches!(
            SweepPool::new(2, &params()),
            Err(PoolError::TooFewBuffers(2))
        ));
    }

    #[test]
    fn test_acquire_prefers_free_list() {
        let mut pool = SweepPool::new(3, &params()).unwrap();
        let buf = pool.acquire_write();
        assert_eq!(pool.free_len(), 2);
        assert_eq!(pool.dropped(), 0);
        pool.return_free(buf);
        assert_eq!(pool.free_len(), 3);
    }

    #[test]
    fn test_starved_pool_evicts_oldest_pending() {
        let mut pool = SweepPool::new(3, &params()).unwrap();

        // One buffer is always the active write target; cycle the other two
        // into pending as "filled" sweeps.
        let active = pool.acquire_write();
        let mut first = pool.acquire_write();
        first.meta.arp = Some(1);
        let first_id = first.sweep_id();
        pool.publish_full(first);
        let mut second = pool.acquire_write();
        second.meta.arp = Some(2);
        pool.publish_full(second);
        assert_eq!(pool.free_len(), 0);
        assert_eq!(pool.pending_len(), 2);

        // Next acquire must steal the oldest pending sweep, cleared.
        let stolen = pool.acquire_write();
        assert_eq!(stolen.sweep_id(), first_id);
        assert_eq!(stolen.meta.arp, None);
        assert_eq!(pool.dropped(), 1);
        assert_eq!(pool.pending_len(), 1);
        drop((active, stolen));
    }

    #[test]
    fn test_checkout_read_is_fifo() {
        let mut pool = SweepPool::new(4, &params()).unwrap();
        let mut a = pool.acquire_write();
        a.meta.arp = Some(1);
        let a_id = a.sweep_id();
        pool.publish_full(a);
        let mut b = pool.acquire_write();
        b.meta.arp = Some(2);
        pool.publish_full(b);

        let read = pool.checkout_read().unwrap();
        assert_eq!(read.sweep_id(), a_id);
        assert_eq!(read.meta.arp, Some(1));
        pool.return_free(read);
        assert_eq!(pool.free_len(), 3);
        assert_eq!(pool.pending_len(), 1);
    }

    #[test]
    fn test_returned_buffers_are_cleared() {
        let mut pool = SweepPool::new(3, &params()).unwrap();
        let mut buf = pool.acquire_write();
        buf.meta.arp = Some(9);
        buf.meta.np = 5;
        pool.return_free(buf);

        let buf = pool.acquire_write();
        assert_eq!(buf.meta.arp, None);
        assert_eq!(buf.meta.np, 0);
    }

    #[test]
    fn test_buffer_count_never_exceeds_capacity() {
        let mut pool = SweepPool::new(3, &params()).unwrap();
        let _active = pool.acquire_write();
        for _ in 0..10 {
            let buf = pool.acquire_write();
            pool.publish_full(buf);
        }
        // One active + everything else split across the two queues.
        assert_eq!(pool.free_len() + pool.pending_len(), 2);
        assert_eq!(pool.dropped(), 8);
    }
}
