//! Rolling frame statistics
//!
//! Keeps a fixed-capacity window of recent frame-arrival timestamps and
//! derives a smoothed frame rate from it, alongside the last resolution,
//! processing latency and connection state. Every operation is total and
//! runs to completion; readers get an immutable [`StatsSnapshot`].

use std::fmt;

use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;
use serde::{Deserialize, Serialize};

use crate::source::frame::{Algorithm, PixelFormat};

/// Timestamps retained for the frame-rate window
pub const FPS_SAMPLE_SIZE: usize = 30;

/// Connection state reported by the frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
    Error,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable read of the aggregator at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub processing_ms: f64,
    pub status: ConnectionStatus,
    pub status_message: Option<String>,
    pub algorithm: Algorithm,
    pub format: PixelFormat,
    /// Millisecond timestamp of the last `record_frame`, 0 before the first
    pub last_update_ms: u64,
}

impl StatsSnapshot {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Human-readable age of the last frame relative to `now_ms`
    pub fn age_label(&self, now_ms: u64) -> String {
        let diff = now_ms.saturating_sub(self.last_update_ms);
        if diff < 1_000 {
            "Just now".to_string()
        } else if diff < 60_000 {
            format!("{}s ago", diff / 1_000)
        } else if diff < 3_600_000 {
            format!("{}m ago", diff / 60_000)
        } else {
            format!("{}h ago", diff / 3_600_000)
        }
    }

    pub fn status_line(&self) -> String {
        match &self.status_message {
            Some(message) => message.clone(),
            None => self.status.label().to_string(),
        }
    }
}

/// Frame statistics aggregator
pub struct StatsAggregator {
    frame_count: u64,
    fps: f64,
    width: u32,
    height: u32,
    processing_ms: f64,
    status: ConnectionStatus,
    status_message: Option<String>,
    algorithm: Algorithm,
    format: PixelFormat,
    last_update_ms: u64,

    /// Arrival timestamps in milliseconds, oldest first
    window: HeapRb<u64>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(FPS_SAMPLE_SIZE)
    }
}

impl StatsAggregator {
    pub fn new(window_size: usize) -> Self {
        Self {
            frame_count: 0,
            fps: 0.0,
            width: 0,
            height: 0,
            processing_ms: 0.0,
            status: ConnectionStatus::Disconnected,
            status_message: None,
            algorithm: Algorithm::Raw,
            format: PixelFormat::Grayscale,
            last_update_ms: 0,
            window: HeapRb::new(window_size.max(2)),
        }
    }

    /// Record one displayed frame arriving at `now_ms`.
    ///
    /// The oldest timestamp is evicted once the window is full. The frame
    /// rate is the windowed average `(n - 1) / span_seconds` once at least
    /// two samples exist; before that it keeps its previous value.
    pub fn record_frame(&mut self, width: u32, height: u32, processing_ms: f64, now_ms: u64) {
        self.frame_count += 1;
        self.width = width;
        self.height = height;
        self.processing_ms = processing_ms;
        self.last_update_ms = now_ms;

        self.window.push_overwrite(now_ms);

        let samples = self.window.occupied_len();
        if samples >= 2 {
            let oldest = self.window.iter().next().copied().unwrap_or(now_ms);
            let span_seconds = (now_ms.saturating_sub(oldest)) as f64 / 1_000.0;
            if span_seconds > 0.0 {
                self.fps = (samples - 1) as f64 / span_seconds;
            }
        }
    }

    /// Overwrite the connection state. Counters are untouched.
    pub fn set_connection_status(&mut self, status: ConnectionStatus, message: Option<String>) {
        self.status = status;
        self.status_message = message;
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn set_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    /// Zero the counters and derived values. Resolution and connection
    /// state survive a reset.
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.fps = 0.0;
        self.processing_ms = 0.0;
        self.window.clear();
    }

    pub fn window_len(&self) -> usize {
        self.window.occupied_len()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frame_count: self.frame_count,
            fps: self.fps,
            width: self.width,
            height: self.height,
            processing_ms: self.processing_ms,
            status: self.status,
            status_message: self.status_message.clone(),
            algorithm: self.algorithm,
            format: self.format,
            last_update_ms: self.last_update_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_has_no_rate_yet() {
        let mut stats = StatsAggregator::default();
        stats.record_frame(640, 480, 4.0, 1_000);

        let snap = stats.snapshot();
        assert_eq!(snap.frame_count, 1);
        assert_eq!(snap.fps, 0.0);
        assert_eq!(snap.resolution(), "640x480");
    }

    #[test]
    fn two_frames_hundred_ms_apart_is_ten_fps() {
        let mut stats = StatsAggregator::default();
        stats.record_frame(640, 480, 0.0, 1_000);
        stats.record_frame(640, 480, 0.0, 1_100);

        let fps = stats.snapshot().fps;
        assert!((fps - 10.0).abs() < 1e-9, "fps was {fps}");
    }

    #[test]
    fn window_is_bounded_at_thirty_samples() {
        let mut stats = StatsAggregator::default();
        for i in 0..35u64 {
            stats.record_frame(320, 240, 0.0, i * 33);
        }

        assert_eq!(stats.window_len(), 30);
        assert_eq!(stats.snapshot().frame_count, 35);
    }

    #[test]
    fn eviction_keeps_rate_over_recent_window() {
        let mut stats = StatsAggregator::default();
        // 40 frames at a steady 100 ms cadence
        for i in 0..40u64 {
            stats.record_frame(320, 240, 0.0, i * 100);
        }

        // 30 samples spanning 2.9 s -> 29 intervals / 2.9 s
        let fps = stats.snapshot().fps;
        assert!((fps - 10.0).abs() < 1e-9, "fps was {fps}");
    }

    #[test]
    fn reset_clears_counters_but_not_status() {
        let mut stats = StatsAggregator::default();
        stats.set_connection_status(ConnectionStatus::Connected, None);
        stats.record_frame(640, 480, 7.5, 1_000);
        stats.record_frame(640, 480, 7.5, 1_050);

        stats.reset();

        let snap = stats.snapshot();
        assert_eq!(snap.frame_count, 0);
        assert_eq!(snap.fps, 0.0);
        assert_eq!(snap.processing_ms, 0.0);
        assert_eq!(stats.window_len(), 0);
        assert_eq!(snap.status, ConnectionStatus::Connected);
        assert_eq!(snap.resolution(), "640x480");
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut stats = StatsAggregator::default();
        stats.record_frame(800, 600, 2.0, 500);
        stats.set_connection_status(ConnectionStatus::Error, Some("source stalled".into()));

        assert_eq!(stats.snapshot(), stats.snapshot());
    }

    #[test]
    fn status_change_leaves_counters_alone() {
        let mut stats = StatsAggregator::default();
        stats.record_frame(640, 480, 1.0, 100);
        stats.set_connection_status(ConnectionStatus::Connecting, None);

        let snap = stats.snapshot();
        assert_eq!(snap.frame_count, 1);
        assert_eq!(snap.status_line(), "Connecting...");
    }

    #[test]
    fn age_label_boundaries() {
        let mut stats = StatsAggregator::default();
        stats.record_frame(640, 480, 0.0, 10_000);
        let snap = stats.snapshot();

        assert_eq!(snap.age_label(10_500), "Just now");
        assert_eq!(snap.age_label(13_000), "3s ago");
        assert_eq!(snap.age_label(10_000 + 120_000), "2m ago");
        assert_eq!(snap.age_label(10_000 + 2 * 3_600_000), "2h ago");
    }
}
