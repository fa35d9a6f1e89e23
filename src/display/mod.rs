pub mod normalize;
pub mod sdl2;

use thiserror::Error;

pub use normalize::{normalize, CanonicalImage, NormalizeError};
pub use sdl2::Sdl2Display;

#[derive(Debug, Error)]
pub enum DisplayError {
    /// A required rendering surface is absent. Fatal at initialization,
    /// never recovered per-frame.
    #[error("no rendering target available: {0}")]
    MissingTarget(String),

    #[error("render failed: {0}")]
    Render(String),
}

/// Pixel-blit output boundary.
///
/// A surface either presents the whole canonical image or fails leaving
/// its previous contents intact.
pub trait BlitSurface {
    fn blit(&mut self, image: &CanonicalImage) -> Result<(), DisplayError>;
}
