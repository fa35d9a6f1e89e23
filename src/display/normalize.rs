//! Pixel-format normalization to the canonical RGBA layout

use thiserror::Error;

use crate::source::frame::{Frame, PixelFormat};

const FULL_ALPHA: u8 = 255;

/// RGBA pixel buffer ready for direct presentation.
/// Always exactly `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed {format} frame: {width}x{height} expects {expected} bytes, got {actual}")]
    MalformedFrame {
        format: PixelFormat,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to decode encoded frame payload")]
    Decode(#[from] image::ImageError),
}

/// Convert a frame to the canonical RGBA buffer.
///
/// Pure function of the frame: on failure nothing is written and the
/// caller's previous display state stands. Raw payloads whose length does
/// not match the declared format and dimensions are rejected as
/// [`NormalizeError::MalformedFrame`]. Encoded payloads are delegated to
/// the image codec; for those the decoded dimensions are authoritative.
pub fn normalize(frame: &Frame) -> Result<CanonicalImage, NormalizeError> {
    if let Some(expected) = frame.expected_len() {
        if frame.data.len() != expected {
            return Err(NormalizeError::MalformedFrame {
                format: frame.format,
                width: frame.width,
                height: frame.height,
                expected,
                actual: frame.data.len(),
            });
        }
    }

    let pixels = match frame.format {
        PixelFormat::Grayscale => {
            let mut rgba = Vec::with_capacity(frame.data.len() * 4);
            for &gray in frame.data.iter() {
                rgba.extend_from_slice(&[gray, gray, gray, FULL_ALPHA]);
            }
            rgba
        }
        PixelFormat::Rgb => {
            let mut rgba = Vec::with_capacity(frame.data.len() / 3 * 4);
            for chunk in frame.data.chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], FULL_ALPHA]);
            }
            rgba
        }
        PixelFormat::Rgba => frame.data.to_vec(),
        PixelFormat::Encoded => {
            let decoded = image::load_from_memory(&frame.data)?.into_rgba8();
            let (width, height) = decoded.dimensions();
            return Ok(CanonicalImage {
                pixels: decoded.into_raw(),
                width,
                height,
            });
        }
    };

    Ok(CanonicalImage {
        pixels,
        width: frame.width,
        height: frame.height,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;
    use crate::source::frame::Algorithm;

    fn frame(format: PixelFormat, width: u32, height: u32, data: Vec<u8>) -> Frame {
        Frame {
            data: Bytes::from(data),
            width,
            height,
            format,
            timestamp: Instant::now(),
            algorithm: Algorithm::Raw,
        }
    }

    #[test]
    fn grayscale_expands_to_opaque_rgba() {
        let frame = frame(PixelFormat::Grayscale, 2, 2, vec![10, 20, 30, 40]);
        let image = normalize(&frame).unwrap();

        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(
            image.pixels,
            vec![10, 10, 10, 255, 20, 20, 20, 255, 30, 30, 30, 255, 40, 40, 40, 255]
        );
    }

    #[test]
    fn grayscale_output_length_is_four_per_pixel() {
        let frame = frame(PixelFormat::Grayscale, 16, 9, vec![128; 16 * 9]);
        let image = normalize(&frame).unwrap();
        assert_eq!(image.pixels.len(), 16 * 9 * 4);
        for pixel in image.pixels.chunks_exact(4) {
            assert_eq!(pixel, [128, 128, 128, 255]);
        }
    }

    #[test]
    fn rgb_copies_channels_and_fills_alpha() {
        let frame = frame(PixelFormat::Rgb, 2, 1, vec![1, 2, 3, 4, 5, 6]);
        let image = normalize(&frame).unwrap();
        assert_eq!(image.pixels, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn rgba_is_byte_exact_identity() {
        let data: Vec<u8> = (0..32).collect();
        let frame = frame(PixelFormat::Rgba, 4, 2, data.clone());
        let image = normalize(&frame).unwrap();
        assert_eq!(image.pixels, data);
    }

    #[test]
    fn short_grayscale_payload_is_malformed() {
        let frame = frame(PixelFormat::Grayscale, 10, 10, vec![0; 99]);
        let err = normalize(&frame).unwrap_err();
        match err {
            NormalizeError::MalformedFrame {
                expected, actual, ..
            } => {
                assert_eq!(expected, 100);
                assert_eq!(actual, 99);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_rgb_payload_is_malformed() {
        let frame = frame(PixelFormat::Rgb, 2, 2, vec![0; 13]);
        assert!(matches!(
            normalize(&frame),
            Err(NormalizeError::MalformedFrame { expected: 12, .. })
        ));
    }

    #[test]
    fn garbage_encoded_payload_is_decode_error() {
        let frame = frame(PixelFormat::Encoded, 4, 4, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(normalize(&frame), Err(NormalizeError::Decode(_))));
    }

    #[test]
    fn encoded_png_decodes_to_rgba() {
        let mut png = Vec::new();
        let source = image::RgbaImage::from_fn(3, 2, |x, y| {
            image::Rgba([x as u8 * 10, y as u8 * 10, 7, 255])
        });
        source
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let frame = frame(PixelFormat::Encoded, 3, 2, png);
        let decoded = normalize(&frame).unwrap();

        assert_eq!(decoded.width, 3);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.pixels, source.into_raw());
    }
}
