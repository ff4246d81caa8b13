//! The capture server: TCP ingestion loop and buffer circulation.
//!
//! One task owns everything on the hot path (the connection, the decoder,
//! the assembler, and the pool), so sweep buffers have a single owner at all
//! times and no locking is needed. Disk I/O is delegated to the publisher
//! task with at most one buffer in flight; the ingestion loop never waits
//! for it.
//!
//! The digitizer connects exactly once. Losing that connection ends the
//! process; the external supervisor restarts it.

use crate::assembler::SweepAssembler;
use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureResult};
use crate::notify::Notifier;
use crate::publisher;
use bytes::BytesMut;
use digdar_pool::{azimuth, AzimuthQuality, SweepBuffer, SweepPool};
use digdar_protocol::{PulseDecoder, BYTES_PER_SAMPLE};
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A bound capture server, ready to accept the digitizer.
pub struct CaptureServer {
    listener: TcpListener,
    notifier: Notifier,
    config: CaptureConfig,
}

impl CaptureServer {
    /// Bind the listen socket and the notification socket.
    pub async fn bind(config: CaptureConfig) -> CaptureResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
        let notifier = Notifier::bind(config.notify_addr).await?;
        Ok(Self {
            listener,
            notifier,
            config,
        })
    }

    /// The bound listen address (useful when configured with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept the digitizer connection and run the ingestion loop until the
    /// connection is lost.
    pub async fn run(self) -> CaptureResult<()> {
        let Self {
            listener,
            notifier,
            config,
        } = self;

        let mut pool = SweepPool::new(config.pool_size, &config.sweep_params())?;
        let mut assembler = SweepAssembler::new(pool.acquire_write(), config.clock_mhz);
        let decoder = PulseDecoder::new(config.samples_per_pulse, BYTES_PER_SAMPLE);

        // Capacity 1: at most one buffer in flight to the publisher.
        let (work_tx, work_rx) = mpsc::channel::<SweepBuffer>(1);
        let (done_tx, mut done_rx) = mpsc::channel::<SweepBuffer>(config.pool_size);
        tokio::spawn(publisher::run(
            work_rx,
            done_tx,
            config.staging_path.clone(),
            config.canonical_path.clone(),
            notifier.clone(),
        ));

        notifier.capture_ready().await;
        info!(
            port = listener.local_addr()?.port(),
            pool = config.pool_size,
            record_len = decoder.record_len(),
            "listening for digitizer"
        );

        let (mut conn, peer) = listener.accept().await?;
        info!(%peer, "digitizer connected");

        let mut read_buf = BytesMut::with_capacity(64 * decoder.record_len());
        let mut in_flight = false;

        loop {
            read_buf.reserve(decoder.record_len());
            tokio::select! {
                read = conn.read_buf(&mut read_buf) => {
                    if read? == 0 {
                        warn!(
                            published = pool.published(),
                            dropped = pool.dropped(),
                            "digitizer closed the connection"
                        );
                        return Err(CaptureError::ConnectionClosed);
                    }
                    Self::drain_pulses(&decoder, &mut read_buf, &mut assembler, &mut pool, config.acps);
                }
                Some(buf) = done_rx.recv() => {
                    pool.return_free(buf);
                    in_flight = false;
                }
            }

            if !in_flight {
                if let Some(sweep) = pool.checkout_read() {
                    match work_tx.send(sweep).await {
                        Ok(()) => in_flight = true,
                        Err(send) => {
                            // Publisher task died; keep ingesting, drop the sweep.
                            error!("publisher task terminated unexpectedly");
                            pool.return_free(send.0);
                        }
                    }
                }
            }
        }
    }

    /// Decode every complete record buffered so far and push it through the
    /// assembler; finalized sweeps get their azimuths corrected and join the
    /// pending queue.
    fn drain_pulses(
        decoder: &PulseDecoder,
        read_buf: &mut BytesMut,
        assembler: &mut SweepAssembler,
        pool: &mut SweepPool,
        acps: u32,
    ) {
        while let Some(pulse) = decoder.decode(read_buf) {
            if let Some(mut full) = assembler.ingest(&pulse, pool) {
                if azimuth::correct(&mut full, acps) == AzimuthQuality::Degraded {
                    warn!(
                        sweep_id = full.sweep_id(),
                        np = full.meta.np,
                        "too few ACP transitions, publishing best-effort azimuths"
                    );
                }
                debug!(
                    sweep_id = full.sweep_id(),
                    np = full.meta.np,
                    ts0 = full.meta.ts0,
                    pending = pool.pending_len() + 1,
                    "sweep finalized"
                );
                pool.publish_full(full);
            }
        }
    }
}
