//! Spectrogram images for clips.

mod colormap;
mod render;

pub use render::PngSpectrogram;

use crate::error::Result;

/// Produces an encoded image for a finished clip.
pub trait SpectrogramRenderer {
    /// Render `samples` to image bytes, or `None` to skip the artifact.
    fn render(&self, samples: &[f32], sample_rate: u32) -> Result<Option<Vec<u8>>>;
}

/// Renderer that never produces an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpectrogram;

impl SpectrogramRenderer for NoSpectrogram {
    fn render(&self, _samples: &[f32], _sample_rate: u32) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
