//! Lazy, non-blocking capture of a texture's pixels.
//!
//! The loader hands a readback task to a [`CopyQueue`] and keeps the only strong
//! reference to the destination slot. The task holds weak references to the slot and
//! to the texture; if either is gone by the time it runs, it does nothing. The buffer
//! is fully built before it is published into the slot, so a reader either sees no
//! buffer or a complete one.

use crate::pixel_buffer::PixelBuffer;
use crate::texture::HitTexture;
use log::{debug, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use uuid::Uuid;

pub type CopyTask = Box<dyn FnOnce() + Send + 'static>;

/// Execution context for readbacks.
pub trait CopyQueue: Send + Sync {
    fn submit(&self, task: CopyTask);
}

/// Runs readbacks on the rayon global pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct RayonCopyQueue;

impl CopyQueue for RayonCopyQueue {
    fn submit(&self, task: CopyTask) {
        rayon::spawn(task);
    }
}

/// Runs readbacks inline on the submitting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateCopyQueue;

impl CopyQueue for ImmediateCopyQueue {
    fn submit(&self, task: CopyTask) {
        task();
    }
}

/// Holds readbacks until [`DeferredCopyQueue::flush`], like a render command list
/// drained once per frame.
#[derive(Default)]
pub struct DeferredCopyQueue {
    tasks: Mutex<VecDeque<CopyTask>>,
}

impl DeferredCopyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs every queued task and returns how many ran.
    pub fn flush(&self) -> usize {
        // Tasks run outside the lock so they may submit follow-up work.
        let drained: Vec<CopyTask> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = drained.len();
        for task in drained {
            task();
        }
        count
    }
}

impl CopyQueue for DeferredCopyQueue {
    fn submit(&self, task: CopyTask) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    Enqueued,
    AlreadyRequested,
    Skipped,
}

struct BufferSlot {
    texture_key: Uuid,
    buffer: Arc<OnceLock<PixelBuffer>>,
}

pub struct PixelBufferLoader {
    queue: Arc<dyn CopyQueue>,
    current: Option<BufferSlot>,
    enqueued_loads: usize,
}

impl PixelBufferLoader {
    pub fn new(queue: Arc<dyn CopyQueue>) -> Self {
        Self {
            queue,
            current: None,
            enqueued_loads: 0,
        }
    }

    /// Starts a readback of `texture` unless one for the same texture already exists.
    pub fn request_load(&mut self, texture: &Arc<dyn HitTexture>) -> LoadRequest {
        let texture_key = texture.texture_key();
        if self
            .current
            .as_ref()
            .is_some_and(|slot| slot.texture_key == texture_key)
        {
            return LoadRequest::AlreadyRequested;
        }

        // Whatever we held belonged to a different texture.
        self.current = None;

        if texture.has_zero_resolution() {
            debug!("skipping pixel readback for zero-sized texture {texture_key}");
            return LoadRequest::Skipped;
        }

        let width = texture.width();
        let height = texture.height();
        let buffer = Arc::new(OnceLock::new());
        let weak_buffer = Arc::downgrade(&buffer);
        let weak_texture = Arc::downgrade(texture);
        self.current = Some(BufferSlot {
            texture_key,
            buffer,
        });
        self.enqueued_loads += 1;

        debug!("enqueueing {width}x{height} pixel readback for texture {texture_key}");
        self.queue.submit(Box::new(move || {
            copy_into_slot(weak_buffer, weak_texture, width, height);
        }));
        LoadRequest::Enqueued
    }

    /// Non-blocking poll; `None` until the readback has been published.
    pub fn try_get_buffer(&self) -> Option<&PixelBuffer> {
        self.current
            .as_ref()?
            .buffer
            .get()
            .filter(|buffer| !buffer.is_empty())
    }

    pub fn is_requested(&self) -> bool {
        self.current.is_some()
    }

    pub fn texture_key(&self) -> Option<Uuid> {
        self.current.as_ref().map(|slot| slot.texture_key)
    }

    /// Drops the current buffer. An in-flight readback will find its slot gone.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn enqueued_loads(&self) -> usize {
        self.enqueued_loads
    }
}

fn copy_into_slot(
    buffer: Weak<OnceLock<PixelBuffer>>,
    texture: Weak<dyn HitTexture>,
    width: u32,
    height: u32,
) {
    if buffer.strong_count() == 0 {
        debug!("pixel buffer owner went away before readback");
        return;
    }
    let Some(texture) = texture.upgrade() else {
        debug!("texture unloaded before readback");
        return;
    };

    let pixels = match texture.read_pixels() {
        Ok(pixels) => pixels,
        Err(e) => {
            warn!("pixel readback for texture {} failed: {e}", texture.texture_key());
            return;
        }
    };
    if (pixels.width(), pixels.height()) != (width, height) {
        warn!(
            "texture {} changed from {width}x{height} to {}x{} during readback",
            texture.texture_key(),
            pixels.width(),
            pixels.height()
        );
        return;
    }

    let Some(buffer) = buffer.upgrade() else {
        debug!("pixel buffer owner went away during readback");
        return;
    };
    if buffer.set(pixels).is_ok() {
        debug!("published pixel buffer for texture {}", texture.texture_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{RasterTexture, TextureError};
    use std::time::{Duration, Instant};

    struct BrokenTexture;

    impl HitTexture for BrokenTexture {
        fn texture_key(&self) -> Uuid {
            Uuid::nil()
        }
        fn width(&self) -> u32 {
            4
        }
        fn height(&self) -> u32 {
            4
        }
        fn read_pixels(&self) -> Result<PixelBuffer, TextureError> {
            Err(TextureError::Readback("device lost".into()))
        }
    }

    fn mask(alphas: &[u8]) -> Arc<dyn HitTexture> {
        Arc::new(RasterTexture::from_alpha_mask(alphas.len() as u32, 1, alphas).unwrap())
    }

    #[test]
    fn second_request_for_same_texture_is_a_no_op() {
        let queue = Arc::new(DeferredCopyQueue::new());
        let mut loader = PixelBufferLoader::new(queue.clone());
        let texture = mask(&[0, 255]);

        assert_eq!(loader.request_load(&texture), LoadRequest::Enqueued);
        assert_eq!(loader.request_load(&texture), LoadRequest::AlreadyRequested);
        assert_eq!(queue.pending(), 1);
        assert_eq!(loader.enqueued_loads(), 1);

        assert!(loader.try_get_buffer().is_none());
        assert_eq!(queue.flush(), 1);
        assert_eq!(loader.try_get_buffer().unwrap().alpha_at(1), Some(255));
    }

    #[test]
    fn reset_before_flush_discards_the_write() {
        let queue = Arc::new(DeferredCopyQueue::new());
        let mut loader = PixelBufferLoader::new(queue.clone());
        loader.request_load(&mask(&[255]));
        loader.reset();
        queue.flush();
        assert!(loader.try_get_buffer().is_none());
        assert!(!loader.is_requested());
    }

    #[test]
    fn dropped_texture_never_publishes() {
        let queue = Arc::new(DeferredCopyQueue::new());
        let mut loader = PixelBufferLoader::new(queue.clone());
        let texture = mask(&[255]);
        loader.request_load(&texture);
        drop(texture);
        queue.flush();
        assert!(loader.is_requested());
        assert!(loader.try_get_buffer().is_none());
    }

    #[test]
    fn loader_dropped_mid_flight_is_harmless() {
        let queue = Arc::new(DeferredCopyQueue::new());
        let texture = mask(&[255]);
        {
            let mut loader = PixelBufferLoader::new(queue.clone());
            loader.request_load(&texture);
        }
        assert_eq!(queue.flush(), 1);
    }

    #[test]
    fn zero_sized_texture_is_skipped() {
        let queue = Arc::new(DeferredCopyQueue::new());
        let mut loader = PixelBufferLoader::new(queue.clone());
        let texture: Arc<dyn HitTexture> =
            Arc::new(RasterTexture::new(image::RgbaImage::new(0, 0)));
        assert_eq!(loader.request_load(&texture), LoadRequest::Skipped);
        assert_eq!(queue.pending(), 0);
        assert!(loader.try_get_buffer().is_none());
    }

    #[test]
    fn failed_readback_stays_not_ready() {
        let mut loader = PixelBufferLoader::new(Arc::new(ImmediateCopyQueue));
        let texture: Arc<dyn HitTexture> = Arc::new(BrokenTexture);
        assert_eq!(loader.request_load(&texture), LoadRequest::Enqueued);
        assert!(loader.try_get_buffer().is_none());
        // still counts as requested, so it is not retried
        assert_eq!(loader.request_load(&texture), LoadRequest::AlreadyRequested);
    }

    #[test]
    fn new_texture_replaces_the_old_buffer() {
        let mut loader = PixelBufferLoader::new(Arc::new(ImmediateCopyQueue));
        let first = mask(&[255]);
        let second = mask(&[0, 0, 7]);
        loader.request_load(&first);
        assert_eq!(loader.try_get_buffer().unwrap().width(), 1);
        loader.request_load(&second);
        assert_eq!(loader.texture_key(), Some(second.texture_key()));
        assert_eq!(loader.try_get_buffer().unwrap().width(), 3);
        assert_eq!(loader.enqueued_loads(), 2);
    }

    #[test]
    fn rayon_queue_publishes_eventually() {
        let mut loader = PixelBufferLoader::new(Arc::new(RayonCopyQueue));
        // the task only holds it weakly
        let texture = mask(&[9, 255]);
        loader.request_load(&texture);
        let deadline = Instant::now() + Duration::from_secs(5);
        while loader.try_get_buffer().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(loader.try_get_buffer().unwrap().alpha_at(0), Some(9));
    }
}
