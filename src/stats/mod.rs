pub mod aggregator;

pub use aggregator::{ConnectionStatus, StatsAggregator, StatsSnapshot, FPS_SAMPLE_SIZE};
