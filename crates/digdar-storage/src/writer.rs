//! Write a finalized sweep to disk and atomically publish it.

use crate::format::encode_header;
use anyhow::{Context, Result};
use bytes::{BufMut, BytesMut};
use digdar_pool::SweepBuffer;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Serialize `sweep` to `staging`, then rename it onto `canonical`.
///
/// The rename is atomic: a consumer holding the previous canonical file open
/// keeps reading a complete sweep until it closes its descriptor. Any failure
/// here is recoverable for the process: the caller drops the sweep, recycles
/// the buffer, and keeps ingesting.
pub async fn write_sweep(sweep: &SweepBuffer, staging: &Path, canonical: &Path) -> Result<()> {
    let header = encode_header(&sweep.meta).context("failed to serialize sweep metadata")?;

    let mut file = File::create(staging)
        .await
        .with_context(|| format!("failed to create staging file {}", staging.display()))?;

    file.write_all(&header)
        .await
        .context("failed to write sweep header")?;

    let np = sweep.meta.np as usize;
    let mut words = BytesMut::with_capacity(np * 4);
    for &clock in sweep.clock_data() {
        words.put_u32_le(clock);
    }
    file.write_all(&words)
        .await
        .context("failed to write clock section")?;

    words.clear();
    for &azimuth in sweep.azimuth_data() {
        words.put_f32_le(azimuth);
    }
    file.write_all(&words)
        .await
        .context("failed to write azimuth section")?;

    words.clear();
    for &trig in sweep.trig_data() {
        words.put_u32_le(trig);
    }
    file.write_all(&words)
        .await
        .context("failed to write trig section")?;

    file.write_all(sweep.sample_data())
        .await
        .context("failed to write sample section")?;

    file.flush().await.context("failed to flush sweep file")?;
    drop(file);

    fs::rename(staging, canonical).await.with_context(|| {
        format!(
            "failed to rename {} -> {}",
            staging.display(),
            canonical.display()
        )
    })?;

    debug!(
        sweep_id = sweep.sweep_id(),
        np,
        bytes = header.len() + np * 12 + sweep.sample_data().len(),
        path = %canonical.display(),
        "sweep published"
    );
    Ok(())
}
