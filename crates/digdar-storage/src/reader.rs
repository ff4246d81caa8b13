//! Parse a sweep file back into memory.
//!
//! The primary consumer is the round-trip tests, but downstream tools (scan
//! conversion, archival inspection) read the same format.

use crate::format::{padding_for, MAGIC};
use anyhow::{anyhow, ensure, Context, Result};
use digdar_pool::SweepMeta;
use std::path::Path;

/// A fully parsed sweep file.
#[derive(Debug)]
pub struct SweepFile {
    /// The JSON metadata record.
    pub meta: SweepMeta,
    /// Trigger clock per pulse.
    pub clocks: Vec<u32>,
    /// Corrected azimuth per pulse.
    pub azimuths: Vec<f32>,
    /// Trigger counter per pulse.
    pub trigs: Vec<u32>,
    /// Raw sample bytes.
    pub samples: Vec<u8>,
}

/// Read and parse the sweep file at `path`.
pub fn read_sweep(path: &Path) -> Result<SweepFile> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read sweep file {}", path.display()))?;

    let rest = data
        .strip_prefix(MAGIC.as_bytes())
        .ok_or_else(|| anyhow!("not a sweep file: bad magic"))?;
    let json_end = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| anyhow!("unterminated metadata record"))?;
    let meta: SweepMeta =
        serde_json::from_slice(&rest[..json_end]).context("invalid sweep metadata")?;

    let header_len = MAGIC.len() + json_end + 1;
    let mut offset = header_len + padding_for(header_len);

    let np = meta.np as usize;
    let ns = meta.ns as usize;
    let bps = meta
        .fmt
        .parse::<usize>()
        .context("invalid sample format field")?
        / 8;

    let clocks = read_section(&data, &mut offset, np, u32::from_le_bytes)?;
    let azimuths = read_section(&data, &mut offset, np, f32::from_le_bytes)?;
    let trigs = read_section(&data, &mut offset, np, u32::from_le_bytes)?;

    let sample_len = np * ns * bps;
    ensure!(
        data.len() >= offset + sample_len,
        "truncated sample section: have {} bytes, need {}",
        data.len() - offset,
        sample_len
    );
    let samples = data[offset..offset + sample_len].to_vec();

    Ok(SweepFile {
        meta,
        clocks,
        azimuths,
        trigs,
        samples,
    })
}

fn read_section<T>(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    from_le: fn([u8; 4]) -> T,
) -> Result<Vec<T>> {
    let end = *offset + count * 4;
    ensure!(data.len() >= end, "truncated sweep file section");
    let values = data[*offset..end]
        .chunks_exact(4)
        .map(|c| from_le([c[0], c[1], c[2], c[3]]))
        .collect();
    *offset = end;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_sweep;
    use digdar_pool::{SweepBuffer, SweepParams};
    use digdar_protocol::DecimMode;

    fn filled_sweep(np: u32) -> SweepBuffer {
        let params = SweepParams {
            max_pulses: 16,
            samples_per_pulse: 4,
            site: "csh".into(),
            clock_mhz: 125.0,
            decim: 1,
            mode: DecimMode::Sum,
        };
        let mut sweep = SweepBuffer::new(&params);
        for i in 0..np as usize {
            sweep.clocks[i] = 100 + i as u32;
            sweep.azimuths[i] = i as f32 / np as f32;
            sweep.trigs[i] = 1000 + i as u32;
            let stride = sweep.ns() * sweep.bps();
            for b in 0..stride {
                sweep.samples[i * stride + b] = (i * stride + b) as u8;
            }
        }
        sweep.meta.np = np;
        sweep.meta.arp = Some(42);
        sweep.meta.ts0 = 1_523_000_000.125;
        sweep.meta.tsn = 1_523_000_002.5;
        sweep.meta.bytes = u64::from(np) * (4 * 2 + 12);
        sweep
    }

    #[tokio::test]
    async fn test_round_trip_recovers_everything() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("new_sweep.dat");
        let canonical = dir.path().join("sweep.dat");

        let sweep = filled_sweep(7);
        write_sweep(&sweep, &staging, &canonical).await.unwrap();

        let parsed = read_sweep(&canonical).unwrap();
        assert_eq!(parsed.meta, sweep.meta);
        assert_eq!(parsed.clocks, sweep.clock_data());
        assert_eq!(parsed.azimuths, sweep.azimuth_data());
        assert_eq!(parsed.trigs, sweep.trig_data());
        assert_eq!(parsed.samples, sweep.sample_data());
    }

    #[tokio::test]
    async fn test_payload_is_eight_byte_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("new_sweep.dat");
        let canonical = dir.path().join("sweep.dat");

        write_sweep(&filled_sweep(3), &staging, &canonical)
            .await
            .unwrap();

        let data = std::fs::read(&canonical).unwrap();
        let rest = data.strip_prefix(MAGIC.as_bytes()).unwrap();
        let json_end = rest.iter().position(|&b| b == b'\n').unwrap();
        let header_len = MAGIC.len() + json_end + 1;
        let pad = padding_for(header_len);
        assert_eq!((header_len + pad) % 8, 0);
        assert!(data[header_len..header_len + pad].iter().all(|&b| b == b' '));
    }

    #[tokio::test]
    async fn test_publish_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("new_sweep.dat");
        let canonical = dir.path().join("sweep.dat");

        write_sweep(&filled_sweep(2), &staging, &canonical)
            .await
            .unwrap();

        assert!(!staging.exists());
        assert!(canonical.exists());
    }

    #[tokio::test]
    async fn test_rename_failure_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("new_sweep.dat");
        let canonical = dir.path().join("no-such-dir").join("sweep.dat");

        let err = write_sweep(&filled_sweep(2), &staging, &canonical)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rename"));
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.dat");
        std::fs::write(&path, b"not a sweep file at all\n").unwrap();
        let err = read_sweep(&path).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }
}
