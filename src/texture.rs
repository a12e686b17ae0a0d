use crate::pixel_buffer::PixelBuffer;
use crate::utils::Rgba8;
use image::RgbaImage;
use resvg::usvg::{Options, Tree};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tiny_skia::{Color, Pixmap};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("expected {width}x{height} pixels, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("texture has zero resolution")]
    Empty,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to parse svg: {0}")]
    Svg(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unsupported texture format {0}")]
    UnsupportedFormat(String),
    #[error("texture readback failed: {0}")]
    Readback(String),
}

/// A texture whose pixels can be read back for hit testing.
///
/// `read_pixels` may block (a GPU readback does), so the loader only calls it from
/// its copy context, never from the thread that handles input.
pub trait HitTexture: Send + Sync {
    /// Identity used to tell whether a buffer already belongs to this texture.
    fn texture_key(&self) -> Uuid;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn read_pixels(&self) -> Result<PixelBuffer, TextureError>;

    fn has_zero_resolution(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// CPU-resident RGBA texture.
#[derive(Debug, Clone)]
pub struct RasterTexture {
    texture_key: Uuid,
    image: RgbaImage,
}

impl RasterTexture {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            texture_key: Uuid::new_v4(),
            image,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba8>) -> Result<Self, TextureError> {
        let buffer = PixelBuffer::new(width, height, pixels)?;
        let raw = bytemuck::cast_slice::<Rgba8, u8>(buffer.pixels()).to_vec();
        let image = RgbaImage::from_raw(width, height, raw).ok_or(TextureError::SizeMismatch {
            width,
            height,
            actual: buffer.pixels().len(),
        })?;
        Ok(Self::new(image))
    }

    /// White texture whose alpha channel is taken from `alphas` (row-major).
    pub fn from_alpha_mask(width: u32, height: u32, alphas: &[u8]) -> Result<Self, TextureError> {
        let pixels = alphas.iter().copied().map(Rgba8::with_alpha).collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Rasterises an SVG document at `scale`.
    pub fn from_svg_str(svg: &str, scale: f32) -> Result<Self, TextureError> {
        let opt = Options::default();
        let rtree =
            Tree::from_str(svg, &opt).map_err(|e| TextureError::Svg(e.to_string()))?;
        let original_size = rtree.size();
        let width = (original_size.width() * scale) as u32;
        let height = (original_size.height() * scale) as u32;

        let mut pixmap = Pixmap::new(width, height).ok_or(TextureError::Empty)?;
        pixmap.fill(Color::TRANSPARENT);
        let transform = tiny_skia::Transform::from_scale(scale, scale);
        resvg::render(&rtree, transform, &mut pixmap.as_mut());

        let image = RgbaImage::from_raw(width, height, pixmap.take()).ok_or(
            TextureError::SizeMismatch {
                width,
                height,
                actual: 0,
            },
        )?;
        Ok(Self::new(image))
    }

    pub fn from_svg_file(path: impl AsRef<Path>, scale: f32) -> Result<Self, TextureError> {
        let svg = fs::read_to_string(path)?;
        Self::from_svg_str(&svg, scale)
    }

    #[cfg(feature = "raster")]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self::new(image))
    }

    #[cfg(feature = "raster")]
    pub fn from_memory(bytes: &[u8]) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(image))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl HitTexture for RasterTexture {
    fn texture_key(&self) -> Uuid {
        self.texture_key
    }

    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn read_pixels(&self) -> Result<PixelBuffer, TextureError> {
        PixelBuffer::from_rgba_bytes(self.image.width(), self.image.height(), self.image.as_raw())
    }
}
