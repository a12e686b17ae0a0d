use crate::texture::TextureError;
use crate::utils::{Position, Rgba8, Size};

/// Immutable snapshot of a texture's pixels, row-major with a top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a buffer from tightly packed RGBA8 bytes (no row padding).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, TextureError> {
        let pixels: &[Rgba8] =
            bytemuck::try_cast_slice(bytes).map_err(|_| TextureError::SizeMismatch {
                width,
                height,
                actual: bytes.len() / 4,
            })?;
        Self::new(width, height, pixels.to_vec())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Maps a widget-local position onto a linear pixel index.
    ///
    /// The local position is floored, normalised by `local_size`, scaled to the
    /// texture resolution and floored again. Anything landing outside the texture,
    /// including negative coordinates and columns past the right edge, yields `None`.
    pub fn sample_index(&self, local: Position, local_size: Size) -> Option<usize> {
        if local_size.is_zero() || self.is_empty() {
            return None;
        }

        let local = local.floor();
        let texel_x = (local.x / local_size.width * self.width as f32).floor();
        let texel_y = (local.y / local_size.height * self.height as f32).floor();

        // written this way round so NaN also fails
        if !(texel_x >= 0.0 && texel_y >= 0.0) {
            return None;
        }
        if texel_x >= self.width as f32 || texel_y >= self.height as f32 {
            return None;
        }

        let index = texel_y as usize * self.width as usize + texel_x as usize;
        (index < self.pixels.len()).then_some(index)
    }

    pub fn alpha_at(&self, index: usize) -> Option<u8> {
        self.pixels.get(index).map(|pixel| pixel.a)
    }
}
