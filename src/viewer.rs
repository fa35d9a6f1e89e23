//! Frame pipeline orchestration
//!
//! Ties the normalizer, the blit surface and the stats aggregator
//! together: one call per incoming frame, run to completion, no partial
//! state on failure.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::display::{normalize, BlitSurface, DisplayError, NormalizeError};
use crate::source::Frame;
use crate::stats::{StatsAggregator, StatsSnapshot};

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Shared handle to the aggregator.
///
/// The render loop records frames while the refresh task reads snapshots
/// from another thread, so access goes through a mutex.
pub type SharedStats = Arc<Mutex<StatsAggregator>>;

fn lock_stats(stats: &SharedStats) -> MutexGuard<'_, StatsAggregator> {
    // Aggregator operations are total; a poisoned lock still holds a
    // consistent aggregator.
    match stats.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Drives one frame at a time from ingestion to display.
pub struct Viewer<S: BlitSurface> {
    surface: S,
    stats: SharedStats,
    epoch: Instant,
}

impl<S: BlitSurface> Viewer<S> {
    pub fn new(surface: S, stats: SharedStats) -> Self {
        Self {
            surface,
            stats,
            epoch: Instant::now(),
        }
    }

    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    /// Normalize, blit and record one frame.
    ///
    /// On any failure the surface and the aggregator are left exactly as
    /// they were before the call.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<(), ViewerError> {
        let normalize_start = Instant::now();
        let image = normalize(frame)?;
        metrics::histogram!("normalize_time_us")
            .record(normalize_start.elapsed().as_micros() as f64);

        self.surface.blit(&image)?;

        let latency = frame.timestamp.elapsed();
        metrics::histogram!("frame_latency_ms").record(latency.as_secs_f64() * 1_000.0);

        let now_ms = self.epoch.elapsed().as_millis() as u64;
        let mut stats = lock_stats(&self.stats);
        stats.record_frame(
            image.width,
            image.height,
            latency.as_secs_f64() * 1_000.0,
            now_ms,
        );
        stats.set_algorithm(frame.algorithm);
        stats.set_format(frame.format);

        Ok(())
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        lock_stats(&self.stats).snapshot()
    }
}

/// Periodic stats refresh as an owned task with a cancel handle.
///
/// Read-only over the aggregator: it re-renders the latest snapshot about
/// once a second and never touches counters.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn spawn(stats: SharedStats, period: Duration) -> Self {
        let epoch = Instant::now();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let snap = lock_stats(&stats).snapshot();
                let now_ms = epoch.elapsed().as_millis() as u64;
                info!(
                    "{} | {} | {:.1} fps | {} frames | {:.1} ms | {} | {}",
                    snap.status_line(),
                    snap.resolution(),
                    snap.fps,
                    snap.frame_count,
                    snap.processing_ms,
                    snap.algorithm,
                    snap.age_label(now_ms)
                );
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
