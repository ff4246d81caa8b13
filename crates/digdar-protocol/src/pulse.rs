//! Pulse record layout and incremental decoder.
//!
//! The digitizer streams fixed-length records: a 32-byte header followed by
//! the sample payload. All integer fields are little-endian and unsigned.
//!
//! Layout (byte offsets):
//!
//! | offset | field          | type  |
//! |--------|----------------|-------|
//! | 0      | magic/reserved | 8 bytes, ignored |
//! | 8      | arpClockSec    | u32   |
//! | 12     | arpClockNsec   | u32   |
//! | 16     | trigClock      | u32   |
//! | 20     | acpClock       | f32   |
//! | 24     | numTrig        | u32   |
//! | 28     | numArp         | u32   |
//! | 32     | samples        | ns × bps bytes |
//!
//! Because the record length is fixed, framing cannot desynchronize: a short
//! read simply leaves bytes buffered until the rest of the record arrives.
//! Content validity is not checked at this layer.

use bytes::{Buf, Bytes, BytesMut};

/// Size of the pulse header, in bytes.
pub const PULSE_HEADER_SIZE: usize = 32;

/// Size of one sample, in bytes (16-bit samples).
pub const BYTES_PER_SAMPLE: usize = 2;

/// One decoded pulse: timing metadata plus the raw sample payload.
///
/// `samples` is a zero-copy view into the receive buffer; the pulse is not
/// retained beyond its copy into a sweep buffer.
#[derive(Debug, Clone)]
pub struct Pulse {
    /// Seconds part of the wall clock latched at the last ARP.
    pub arp_clock_sec: u32,
    /// Nanoseconds part of the wall clock latched at the last ARP.
    pub arp_clock_nsec: u32,
    /// Digitizer clock ticks between ARP detection and trigger detection.
    pub trig_clock: u32,
    /// Raw azimuth count: whole ACPs since the ARP plus a fractional
    /// elapsed-time term. Only the whole part is trustworthy.
    pub acp_clock: f32,
    /// Trigger pulse counter.
    pub num_trig: u32,
    /// Antenna rotation counter; a change marks a sweep boundary.
    pub num_arp: u32,
    /// Raw sample bytes, `ns * bps` of them.
    pub samples: Bytes,
}

/// Incremental decoder for a stream of pulse records.
///
/// Holds no state beyond the record geometry; partial records stay in the
/// caller's buffer untouched, so the read loop can never spin on incomplete
/// data.
#[derive(Debug, Clone, Copy)]
pub struct PulseDecoder {
    record_len: usize,
}

impl PulseDecoder {
    /// Create a decoder for records of `samples_per_pulse` samples of
    /// `bytes_per_sample` bytes each.
    #[must_use]
    pub fn new(samples_per_pulse: usize, bytes_per_sample: usize) -> Self {
        Self {
            record_len: PULSE_HEADER_SIZE + samples_per_pulse * bytes_per_sample,
        }
    }

    /// Total length of one record, header included.
    #[inline]
    #[must_use]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Try to extract exactly one record from `buf`.
    ///
    /// Returns `None` without touching the buffer when fewer than
    /// [`record_len`](Self::record_len) bytes are available; otherwise
    /// consumes exactly one record and returns the decoded pulse. The sample
    /// payload is split off the buffer without copying.
    pub fn decode(&self, buf: &mut BytesMut) -> Option<Pulse> {
        if buf.len() < self.record_len {
            return None;
        }
        let mut rec = buf.split_to(self.record_len);
        rec.advance(8); // magic/reserved
        let arp_clock_sec = rec.get_u32_le();
        let arp_clock_nsec = rec.get_u32_le();
        let trig_clock = rec.get_u32_le();
        let acp_clock = rec.get_f32_le();
        let num_trig = rec.get_u32_le();
        let num_arp = rec.get_u32_le();
        Some(Pulse {
            arp_clock_sec,
            arp_clock_nsec,
            trig_clock,
            acp_clock,
            num_trig,
            num_arp,
            samples: rec.freeze(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    const NS: usize = 8;

    fn record(arp: u32, trig_clock: u32, acp: f32, num_trig: u32, fill: u8) -> Vec<u8> {
        let mut rec = Vec::with_capacity(PULSE_HEADER_SIZE + NS * BYTES_PER_SAMPLE);
        rec.put_u64_le(0xD1DA); // magic/reserved
        rec.put_u32_le(1_500_000_000); // arpClockSec
        rec.put_u32_le(250_000); // arpClockNsec
        rec.put_u32_le(trig_clock);
        rec.put_f32_le(acp);
        rec.put_u32_le(num_trig);
        rec.put_u32_le(arp);
        rec.resize(PULSE_HEADER_SIZE + NS * BYTES_PER_SAMPLE, fill);
        rec
    }

    #[test]
    fn test_partial_record_leaves_buffer_untouched() {
        let decoder = PulseDecoder::new(NS, BYTES_PER_SAMPLE);
        let rec = record(1, 100, 3.5, 7, 0xAB);
        let mut buf = BytesMut::from(&rec[..rec.len() - 1]);

        assert!(decoder.decode(&mut buf).is_none());
        assert_eq!(buf.len(), rec.len() - 1);
    }

    #[test]
    fn test_decode_parses_fields_and_advances() {
        let decoder = PulseDecoder::new(NS, BYTES_PER_SAMPLE);
        let mut buf = BytesMut::from(&record(42, 12345, 17.25, 9001, 0xCD)[..]);

        let pulse = decoder.decode(&mut buf).unwrap();
        assert_eq!(pulse.arp_clock_sec, 1_500_000_000);
        assert_eq!(pulse.arp_clock_nsec, 250_000);
        assert_eq!(pulse.trig_clock, 12345);
        assert_eq!(pulse.acp_clock, 17.25);
        assert_eq!(pulse.num_trig, 9001);
        assert_eq!(pulse.num_arp, 42);
        assert_eq!(pulse.samples.len(), NS * BYTES_PER_SAMPLE);
        assert!(pulse.samples.iter().all(|&b| b == 0xCD));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_consumes_exactly_one_record() {
        let decoder = PulseDecoder::new(NS, BYTES_PER_SAMPLE);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&record(1, 10, 0.5, 1, 0x01));
        buf.extend_from_slice(&record(1, 20, 0.6, 2, 0x02));
        buf.extend_from_slice(&record(2, 30, 0.7, 3, 0x03)[..10]);

        let first = decoder.decode(&mut buf).unwrap();
        assert_eq!(first.num_trig, 1);
        let second = decoder.decode(&mut buf).unwrap();
        assert_eq!(second.num_trig, 2);
        // Third record is incomplete.
        assert!(decoder.decode(&mut buf).is_none());
        assert_eq!(buf.len(), 10);
    }
}
