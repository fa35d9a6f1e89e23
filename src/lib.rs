pub mod display;
pub mod source;
pub mod stats;
pub mod viewer;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use source::simulate::Pattern;

pub use display::{normalize, BlitSurface, CanonicalImage, DisplayError, NormalizeError};
pub use source::{Algorithm, Frame, PixelFormat};
pub use stats::{ConnectionStatus, StatsAggregator, StatsSnapshot};
pub use viewer::{RefreshTask, SharedStats, Viewer, ViewerError};

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<ViewerConfig>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(ViewerConfig::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub source: SourceConfig,
    pub display: DisplayConfig,
    pub stats: StatsConfig,
    /// Bound of the frame hand-off channel
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Timestamps kept for the frame-rate window
    pub window_size: usize,
    pub refresh_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                width: 640,
                height: 480,
                fps: 15,
                pattern: Pattern::EdgeSample,
            },
            display: DisplayConfig {
                width: 640,
                height: 480,
            },
            stats: StatsConfig {
                window_size: stats::FPS_SAMPLE_SIZE,
                refresh_interval_ms: 1_000,
            },
            channel_capacity: 8,
        }
    }
}
