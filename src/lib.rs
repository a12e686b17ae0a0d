//! Buttons that only respond where their texture is opaque.
//!
//! [`shape_button::AlphaHitButton`] wraps a [`button::BaseButton`] and gates its hover,
//! press and release handling on the alpha of the pixel under the pointer. Pixels come
//! from a [`texture::HitTexture`], read back once on a [`loader::CopyQueue`] so the
//! input thread never waits on the GPU. [`widgets::shape_button::ShapeButton`] is the
//! ready-made widget that ties it to a rectangle, a config file and frame input.

pub mod button;
pub mod config;
pub mod dispatch;
#[cfg(feature = "backend-wgpu")]
pub mod gpu_texture;
pub mod hover;
pub mod loader;
pub mod pixel_buffer;
pub mod shape_button;
pub mod texture;
pub mod utils;
pub mod widgets {
    pub mod shape_button;
}

pub use button::{BaseButton, ClickMethod, Reply, StandardButton};
pub use config::{ConfigError, ShapeButtonConfig};
#[cfg(feature = "backend-wgpu")]
pub use gpu_texture::GpuTexture;
pub use loader::{
    CopyQueue, DeferredCopyQueue, ImmediateCopyQueue, PixelBufferLoader, RayonCopyQueue,
};
pub use pixel_buffer::PixelBuffer;
pub use shape_button::AlphaHitButton;
pub use texture::{HitTexture, RasterTexture, TextureError};
pub use widgets::shape_button::ShapeButton;
