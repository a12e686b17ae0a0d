use crate::pixel_buffer::PixelBuffer;
use crate::texture::{HitTexture, TextureError};
use image::RgbaImage;
use std::sync::Arc;
use uuid::Uuid;

const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;

/// Creates a surface-less device for readbacks. `None` when the machine has no
/// usable adapter (CI without a GPU or software rasteriser).
pub fn headless_device() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        force_fallback_adapter: false,
        compatible_surface: None,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("shape-button-readback"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
        },
        None,
    ))
    .ok()?;
    Some((Arc::new(device), Arc::new(queue)))
}

/// RGBA8 texture living on the GPU. Reading it back copies the first mip level
/// into a mappable buffer and waits for the map, so it belongs on a copy context.
#[derive(Debug)]
pub struct GpuTexture {
    texture_key: Uuid,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    texture: wgpu::Texture,
}

impl GpuTexture {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        texture: wgpu::Texture,
    ) -> Result<Self, TextureError> {
        match texture.format() {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
            other => return Err(TextureError::UnsupportedFormat(format!("{other:?}"))),
        }
        if !texture.usage().contains(wgpu::TextureUsages::COPY_SRC) {
            return Err(TextureError::UnsupportedFormat(
                "texture was created without COPY_SRC".to_string(),
            ));
        }
        Ok(Self {
            texture_key: Uuid::new_v4(),
            device,
            queue,
            texture,
        })
    }

    pub fn upload(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        image: &RgbaImage,
    ) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Hit Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[wgpu::TextureFormat::Rgba8UnormSrgb],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        Self::new(device, queue, texture)
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl HitTexture for GpuTexture {
    fn texture_key(&self) -> Uuid {
        self.texture_key
    }

    fn width(&self) -> u32 {
        self.texture.width()
    }

    fn height(&self) -> u32 {
        self.texture.height()
    }

    fn read_pixels(&self) -> Result<PixelBuffer, TextureError> {
        let size = self.texture.size();
        if size.width == 0 || size.height == 0 {
            return Err(TextureError::Empty);
        }
        let unpadded_bytes_per_row = size.width * 4;
        let bytes_per_row = unpadded_bytes_per_row.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT)
            * COPY_BYTES_PER_ROW_ALIGNMENT;

        let output = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hit-texture-readback"),
            size: (bytes_per_row as u64) * (size.height as u64),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("hit-texture-readback-encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &output,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(size.height),
                },
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = output.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| TextureError::Readback(e.to_string()))?
            .map_err(|e| TextureError::Readback(e.to_string()))?;

        let view = slice.get_mapped_range();
        let mut rgba = Vec::with_capacity((unpadded_bytes_per_row * size.height) as usize);
        for row in view.chunks(bytes_per_row as usize) {
            rgba.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(view);
        output.unmap();

        PixelBuffer::from_rgba_bytes(size.width, size.height, &rgba)
    }
}
