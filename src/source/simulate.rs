//! Simulated frame source
//!
//! Stands in for the future transport by synthesizing deterministic test
//! frames at a fixed cadence and sending them down the pipeline channel.

use std::io::Cursor;
use std::time::{Duration, Instant};

use bytes::Bytes;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::source::frame::{Algorithm, Frame, PixelFormat};
use crate::SourceConfig;

/// Synthetic frame patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// Grayscale edge-like pattern with pseudo-noise
    EdgeSample,
    /// Grayscale calibration grid with corner markers
    TestGrid,
    /// RGB diagonal gradient
    Gradient,
    /// The calibration grid encoded as PNG, exercising the codec path
    EncodedGrid,
}

impl Pattern {
    fn format(self) -> PixelFormat {
        match self {
            Pattern::EdgeSample | Pattern::TestGrid => PixelFormat::Grayscale,
            Pattern::Gradient => PixelFormat::Rgb,
            Pattern::EncodedGrid => PixelFormat::Encoded,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Pattern::EdgeSample => Algorithm::EdgeDetect,
            Pattern::TestGrid | Pattern::Gradient | Pattern::EncodedGrid => Algorithm::Raw,
        }
    }
}

/// Deterministic pattern generator
pub struct SimulatedSource {
    config: SourceConfig,
    sequence: u64,
}

impl SimulatedSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            sequence: 0,
        }
    }

    /// Produce the next well-formed frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let width = self.config.width;
        let height = self.config.height;
        let pattern = self.config.pattern;

        let data = match pattern {
            Pattern::EdgeSample => edge_sample(width, height, self.sequence),
            Pattern::TestGrid => test_grid(width, height),
            Pattern::Gradient => gradient(width, height, self.sequence),
            Pattern::EncodedGrid => encode_grid(width, height)?,
        };

        self.sequence += 1;
        Ok(Frame {
            data: Bytes::from(data),
            width,
            height,
            format: pattern.format(),
            timestamp: Instant::now(),
            algorithm: pattern.algorithm(),
        })
    }
}

/// Feed frames into the pipeline at the configured rate.
///
/// Runs until the receiving side hangs up.
pub async fn run_source(config: SourceConfig, tx: flume::Sender<Frame>) -> Result<()> {
    info!(
        "Starting simulated source: {}x{} @ {} fps, pattern {:?}",
        config.width, config.height, config.fps, config.pattern
    );

    let period = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let mut ticker = tokio::time::interval(period);
    let mut source = SimulatedSource::new(config);

    loop {
        ticker.tick().await;
        let frame = source.next_frame()?;
        if tx.send_async(frame).await.is_err() {
            debug!("Frame receiver dropped, stopping source");
            break;
        }
    }

    Ok(())
}

/// Edge-like pattern: horizontal and vertical sine bands plus circular
/// ripples, with a little deterministic noise on top.
fn edge_sample(width: u32, height: u32, sequence: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height) as usize);
    let mut noise = Lcg::new(sequence.wrapping_add(1));
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;

    for y in 0..height {
        for x in 0..width {
            let mut intensity: f64 = 0.0;

            if (y as f64 / 20.0).sin().abs() > 0.9 {
                intensity = 255.0;
            }
            if (x as f64 / 30.0).sin().abs() > 0.85 {
                intensity = intensity.max(200.0);
            }

            let dx = x as f64 - center_x;
            let dy = y as f64 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance / 40.0).sin().abs() > 0.8 {
                intensity = intensity.max(150.0);
            }

            intensity += noise.next_centered() * 30.0;
            data.push(intensity.clamp(0.0, 255.0) as u8);
        }
    }

    data
}

/// Calibration grid: 40 px line spacing, 20 px corner markers.
fn test_grid(width: u32, height: u32) -> Vec<u8> {
    const SPACING: u32 = 40;
    const MARKER: u32 = 20;

    let mut data = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let on_grid = x % SPACING == 0 || y % SPACING == 0;
            let in_marker = (x < MARKER || x >= width.saturating_sub(MARKER))
                && (y < MARKER || y >= height.saturating_sub(MARKER));
            if on_grid || in_marker {
                data[(y * width + x) as usize] = 255;
            }
        }
    }
    data
}

/// RGB gradient that drifts with the sequence number so motion is visible.
fn gradient(width: u32, height: u32, sequence: u64) -> Vec<u8> {
    let shift = (sequence % 256) as u32;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(((x * 255 / width.max(1)) + shift) as u8);
            data.push((y * 255 / height.max(1)) as u8);
            data.push(((x + y) * 255 / (width + height).max(1)) as u8);
        }
    }
    data
}

fn encode_grid(width: u32, height: u32) -> Result<Vec<u8>> {
    let gray = test_grid(width, height);
    let image = image::GrayImage::from_raw(width, height, gray)
        .ok_or_else(|| color_eyre::eyre::eyre!("grid buffer did not match dimensions"))?;

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Small deterministic noise source, no external RNG needed.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform-ish value in [-0.5, 0.5)
    fn next_centered(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f64 / (1u64 << 31) as f64) - 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pattern: Pattern) -> SourceConfig {
        SourceConfig {
            width: 64,
            height: 48,
            fps: 15,
            pattern,
        }
    }

    #[test]
    fn frames_are_length_consistent() {
        for pattern in [Pattern::EdgeSample, Pattern::TestGrid, Pattern::Gradient] {
            let mut source = SimulatedSource::new(config(pattern));
            let frame = source.next_frame().unwrap();
            assert_eq!(Some(frame.data.len()), frame.expected_len(), "{pattern:?}");
        }
    }

    #[test]
    fn encoded_grid_survives_normalization() {
        let mut source = SimulatedSource::new(config(Pattern::EncodedGrid));
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.format, PixelFormat::Encoded);

        let image = crate::display::normalize(&frame).unwrap();
        assert_eq!(image.width, 64);
        assert_eq!(image.height, 48);
        assert_eq!(image.pixels.len(), 64 * 48 * 4);
    }

    #[test]
    fn edge_sample_is_deterministic_per_sequence() {
        let mut a = SimulatedSource::new(config(Pattern::EdgeSample));
        let mut b = SimulatedSource::new(config(Pattern::EdgeSample));
        assert_eq!(a.next_frame().unwrap().data, b.next_frame().unwrap().data);
    }
}
