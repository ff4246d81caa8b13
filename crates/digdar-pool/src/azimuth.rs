//! Azimuth correction for a completed sweep.
//!
//! Raw per-pulse azimuths arrive as `N + M`: `N` whole ACPs counted since the
//! ARP, plus a fractional term `M` derived from elapsed time since the most
//! recent ACP. Only `N` is trustworthy. Assuming the antenna rotates at
//! constant speed between consecutive ACP marks, pulses within one ACP
//! segment are spread linearly across it, and the whole array is rewritten in
//! place as fractions of a full rotation in [0, 1), rotated so pulse 0 holds
//! the minimum.
//!
//! A sweep with fewer than two ACP transitions cannot be interpolated; it is
//! still published, with raw counts scaled into [0, 1) and the sweep marked
//! degraded.

use crate::sweep::SweepBuffer;

/// Outcome of a correction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzimuthQuality {
    /// At least two ACP transitions: azimuths fully interpolated.
    Full,
    /// Too few ACP transitions: best-effort values, sweep marked degraded.
    Degraded,
}

/// Correct `sweep`'s azimuths in place, given the nominal ACP count per
/// rotation. Sets `meta.degraded` when the result is best-effort.
pub fn correct(sweep: &mut SweepBuffer, acps: u32) -> AzimuthQuality {
    let acps = acps as f32;
    let azi = sweep.azimuth_data_mut();
    if azi.is_empty() {
        sweep.meta.degraded = true;
        return AzimuthQuality::Degraded;
    }

    let quality = if count_transitions(azi) >= 2 {
        interpolate(azi, acps);
        AzimuthQuality::Full
    } else {
        // Not enough marks to interpolate between; the raw counts are the
        // best estimate available.
        for a in azi.iter_mut() {
            *a /= acps;
        }
        AzimuthQuality::Degraded
    };
    normalize(azi);

    if quality == AzimuthQuality::Degraded {
        sweep.meta.degraded = true;
    }
    quality
}

/// Count ACP transitions: positions where the whole ACP count has advanced
/// past the previous segment's base.
fn count_transitions(azi: &[f32]) -> usize {
    let mut transitions = 0;
    let mut base = azi[0].floor();
    for &a in &azi[1..] {
        if a - base >= 1.0 {
            transitions += 1;
            base = a.floor();
        }
    }
    transitions
}

/// Linearly interpolate each ACP segment, then the circular wrap segment
/// spanning from the last transition through index 0 to the first.
fn interpolate(azi: &mut [f32], acps: f32) {
    let np = azi.len();

    // Find the first transition.
    let base = azi[0].floor();
    let mut i = 1;
    while i < np && azi[i] - base < 1.0 {
        i += 1;
    }
    let ifirst = i;
    let mut ilast = i;
    let mut acp_count = 1u32;

    // Interior segments, bounded by consecutive transitions.
    while i < np {
        let base = azi[ilast].floor();
        while i < np && azi[i] - base < 1.0 {
            i += 1;
        }
        if i >= np {
            break;
        }
        let scale = 1.0 / (i - ilast) as f32;
        for j in ilast..i {
            azi[j] = (acp_count as f32 + (j - ilast) as f32 * scale) / acps;
        }
        ilast = i;
        acp_count += 1;
        i += 1;
    }

    // Wrap segment: from the last transition through index 0 back to the
    // first transition, one circular segment.
    let wrap_len = np - ilast + ifirst;
    let scale = 1.0 / wrap_len as f32;
    let mut idx = ilast;
    let mut step = 0u32;
    while idx != ifirst {
        azi[idx] = (acp_count as f32 + step as f32 * scale) / acps;
        step += 1;
        idx += 1;
        if idx >= np {
            idx = 0;
        }
    }
}

/// Rotate values so index 0 holds the minimum: subtract `azi[0]`, wrapping
/// negative results back into [0, 1).
fn normalize(azi: &mut [f32]) {
    let azimin = azi[0];
    for a in azi.iter_mut() {
        *a -= azimin;
        if *a < 0.0 {
            *a += 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{SweepBuffer, SweepParams};
    use digdar_protocol::DecimMode;

    const ACPS: u32 = 12;

    fn sweep_with_azimuths(raw: &[f32]) -> SweepBuffer {
        let mut buf = SweepBuffer::new(&SweepParams {
            max_pulses: raw.len().max(1),
            samples_per_pulse: 1,
            site: "test".into(),
            clock_mhz: 125.0,
            decim: 1,
            mode: DecimMode::Sum,
        });
        buf.azimuths[..raw.len()].copy_from_slice(raw);
        buf.meta.np = raw.len() as u32;
        buf
    }

    /// Full rotation: 12 ACPs, 8 pulses per ACP, constant fractional term.
    fn even_rotation() -> Vec<f32> {
        (0..96).map(|i| (i / 8) as f32 + 0.4).collect()
    }

    #[test]
    fn test_even_rotation_is_monotone_with_minimum_at_zero() {
        let mut sweep = sweep_with_azimuths(&even_rotation());
        let quality = correct(&mut sweep, ACPS);
        assert_eq!(quality, AzimuthQuality::Full);
        assert!(!sweep.meta.degraded);

        let azi = sweep.azimuth_data();
        assert_eq!(azi[0], 0.0);
        assert!(azi.iter().all(|&a| (0.0..1.0).contains(&a)));
        assert!(azi[1..].iter().all(|&a| a >= azi[0]));

        // At most one wrap point over the whole rotation.
        let decreases = azi.windows(2).filter(|w| w[1] < w[0]).count();
        assert!(decreases <= 1, "expected a single wrap, got {decreases}");
    }

    #[test]
    fn test_even_rotation_interpolates_within_segments() {
        let mut sweep = sweep_with_azimuths(&even_rotation());
        correct(&mut sweep, ACPS);

        // Pulses 0..8 precede the first ACP mark; the first interior segment
        // starts at index 8 with whole-ACP count 1, shifted by the rotation
        // that puts index 0 at zero.
        let azi = sweep.azimuth_data();
        let shift = 11.5 / 12.0;
        let expected = 1.0 / 12.0 - shift + 1.0;
        assert!((azi[8] - expected).abs() < 1e-5);
        // Within a segment, consecutive pulses are 1/(8*12) of a rotation
        // apart.
        let step = 1.0 / (8.0 * 12.0);
        assert!((azi[9] - azi[8] - step).abs() < 1e-5);
    }

    #[test]
    fn test_no_transitions_is_degraded_but_bounded() {
        let raw: Vec<f32> = (0..10).map(|i| 5.0 + i as f32 * 0.05).collect();
        let mut sweep = sweep_with_azimuths(&raw);
        let quality = correct(&mut sweep, ACPS);

        assert_eq!(quality, AzimuthQuality::Degraded);
        assert!(sweep.meta.degraded);
        let azi = sweep.azimuth_data();
        assert_eq!(azi[0], 0.0);
        assert!(azi.iter().all(|&a| (0.0..1.0).contains(&a)));
    }

    #[test]
    fn test_single_transition_is_degraded() {
        let raw: Vec<f32> = (0..10).map(|i| if i < 5 { 3.2 } else { 4.2 }).collect();
        let mut sweep = sweep_with_azimuths(&raw);
        assert_eq!(correct(&mut sweep, ACPS), AzimuthQuality::Degraded);
        assert!(sweep.meta.degraded);
    }

    #[test]
    fn test_empty_sweep_is_degraded() {
        let mut sweep = sweep_with_azimuths(&[]);
        assert_eq!(correct(&mut sweep, ACPS), AzimuthQuality::Degraded);
    }

    #[test]
    fn test_count_transitions() {
        assert_eq!(count_transitions(&[0.1, 0.5, 0.9]), 0);
        assert_eq!(count_transitions(&[0.1, 1.2, 1.9]), 1);
        assert_eq!(count_transitions(&[0.1, 1.2, 2.5, 3.1]), 3);
    }
}
