use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Frame data with zero-copy semantics
#[derive(Clone)]
pub struct Frame {
    /// Immutable frame payload - can be shared across threads without copying
    pub data: Bytes,

    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,

    /// Capture timestamp for latency tracking
    pub timestamp: Instant,

    /// How the frame was produced. Informational only, never interpreted
    /// by the normalizer.
    pub algorithm: Algorithm,
}

impl Frame {
    /// Expected payload length for the declared format and dimensions.
    /// `None` for encoded payloads, whose length is opaque to us.
    pub fn expected_len(&self) -> Option<usize> {
        self.format
            .bytes_per_pixel()
            .map(|bpp| self.width as usize * self.height as usize * bpp)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Pixel formats we accept from the frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Grayscale,
    Rgb,
    Rgba,
    /// Compressed image payload (PNG/JPEG), decoded by the codec
    Encoded,
}

impl PixelFormat {
    /// Bytes per pixel for raw formats; `None` for encoded payloads.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Grayscale => Some(1),
            PixelFormat::Rgb => Some(3),
            PixelFormat::Rgba => Some(4),
            PixelFormat::Encoded => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PixelFormat::Grayscale => "Grayscale",
            PixelFormat::Rgb => "RGB",
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Encoded => "Encoded",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Processing algorithm tag attached by the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Raw,
    EdgeDetect,
    GrayscaleConversion,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Algorithm::Raw => "Raw Feed",
            Algorithm::EdgeDetect => "Canny Edge Detection",
            Algorithm::GrayscaleConversion => "Grayscale Conversion",
        };
        f.write_str(label)
    }
}
