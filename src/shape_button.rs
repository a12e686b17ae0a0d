//! Button that only reacts where its texture is opaque.
//!
//! Every pointer event first records the widget geometry and pointer position. The
//! pixel under the pointer is looked up in a buffer read back from the hit texture on
//! first enter. `can_hover` gates whether the base button may report itself hovered:
//! it is granted optimistically on enter, promoted on a move over an opaque pixel,
//! and withdrawn on leave or after every release. Each tick clears the recorded
//! geometry so a button that stops receiving moves (something opened on top of it)
//! gets a synthetic leave one frame later.

use crate::button::{BaseButton, Reply, StandardButton};
use crate::hover::{ConstantHover, HoverSource, PredicateHover};
use crate::loader::{CopyQueue, LoadRequest, PixelBufferLoader};
use crate::texture::HitTexture;
use crate::utils::{Geometry, PointerEvent};
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Weak};
use winit::window::CursorIcon;

pub const DEFAULT_ALPHA_THRESHOLD: u8 = 1;

/// Pointer sample, hit texture and threshold; everything the hit predicate reads.
pub struct AlphaHitTester {
    geometry: Geometry,
    event: PointerEvent,
    alpha_threshold: u8,
    texture: Option<Weak<dyn HitTexture>>,
    loader: PixelBufferLoader,
}

impl AlphaHitTester {
    pub fn new(queue: Arc<dyn CopyQueue>) -> Self {
        Self {
            geometry: Geometry::empty(),
            event: PointerEvent::default(),
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            texture: None,
            loader: PixelBufferLoader::new(queue),
        }
    }

    pub fn update_mouse_data(&mut self, geometry: &Geometry, event: &PointerEvent) {
        self.geometry = *geometry;
        self.event = *event;
    }

    pub fn update_pointer(&mut self, event: &PointerEvent) {
        self.event = *event;
    }

    pub fn reset_geometry(&mut self) {
        self.geometry = Geometry::empty();
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn event(&self) -> &PointerEvent {
        &self.event
    }

    pub fn alpha_threshold(&self) -> u8 {
        self.alpha_threshold
    }

    pub fn set_alpha_threshold(&mut self, alpha_threshold: u8) {
        self.alpha_threshold = alpha_threshold;
    }

    pub fn loader(&self) -> &PixelBufferLoader {
        &self.loader
    }

    pub fn is_buffer_ready(&self) -> bool {
        self.loader.try_get_buffer().is_some()
    }

    /// Returns true when the recorded pointer is over a pixel whose alpha is strictly
    /// greater than the threshold. Zero geometry, a zero threshold, a missing buffer
    /// and out-of-range samples all read as "not opaque".
    pub fn is_alpha_pixel_hovered(&self) -> bool {
        let local_size = self.geometry.local_size();
        if local_size.is_zero() || self.alpha_threshold == 0 {
            return false;
        }
        let Some(buffer) = self.loader.try_get_buffer() else {
            return false;
        };

        let local = self.geometry.absolute_to_local(self.event.screen_position);
        buffer
            .sample_index(local, local_size)
            .and_then(|index| buffer.alpha_at(index))
            .is_some_and(|alpha| alpha > self.alpha_threshold)
    }

    /// The hit decision used for hover gating. A zero threshold switches alpha
    /// testing off and falls back to the widget rectangle.
    pub fn hit_test(&self) -> bool {
        if self.alpha_threshold == 0 {
            return !self.geometry.has_zero_size()
                && self.geometry.contains_absolute(self.event.screen_position);
        }
        self.is_alpha_pixel_hovered()
    }

    pub fn source_texture(&self) -> Option<Arc<dyn HitTexture>> {
        self.texture.as_ref()?.upgrade()
    }

    /// Swaps the hit texture. The old buffer is discarded; if it had already been
    /// requested, the new texture is requested straight away.
    pub fn set_source_texture(&mut self, texture: &Arc<dyn HitTexture>) {
        if self
            .source_texture()
            .is_some_and(|current| current.texture_key() == texture.texture_key())
        {
            return;
        }
        debug!("hit texture set to {}", texture.texture_key());
        let was_requested = self.loader.is_requested();
        self.loader.reset();
        self.texture = Some(Arc::downgrade(texture));
        if was_requested {
            self.loader.request_load(texture);
        }
    }

    pub fn clear_source_texture(&mut self) {
        self.texture = None;
        self.loader.reset();
    }

    /// Requests the pixel buffer for the current texture; later calls are no-ops.
    pub fn try_update_raw_colors_once(&mut self) -> LoadRequest {
        let Some(texture) = self.source_texture() else {
            debug!("no hit texture set, alpha testing stays inactive");
            return LoadRequest::Skipped;
        };
        self.loader.request_load(&texture)
    }
}

pub struct AlphaHitButton<B = StandardButton> {
    base: B,
    tester: Rc<RefCell<AlphaHitTester>>,
    can_hover: bool,
    is_hovered_cached: bool,
    cursor: Option<CursorIcon>,
    tooltip: Option<String>,
}

impl<B: BaseButton> AlphaHitButton<B> {
    pub fn new(mut base: B, queue: Arc<dyn CopyQueue>) -> Self {
        // Hover is owned by this widget from the start.
        base.set_hover(Some(Box::new(ConstantHover(false))));
        Self {
            base,
            tester: Rc::new(RefCell::new(AlphaHitTester::new(queue))),
            can_hover: false,
            is_hovered_cached: false,
            cursor: None,
            tooltip: None,
        }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }

    pub fn set_source_texture(&mut self, texture: &Arc<dyn HitTexture>) {
        self.tester.borrow_mut().set_source_texture(texture);
    }

    pub fn clear_source_texture(&mut self) {
        self.tester.borrow_mut().clear_source_texture();
    }

    pub fn set_alpha_threshold(&mut self, alpha_threshold: u8) {
        self.tester.borrow_mut().set_alpha_threshold(alpha_threshold);
    }

    pub fn alpha_threshold(&self) -> u8 {
        self.tester.borrow().alpha_threshold()
    }

    pub fn can_hover(&self) -> bool {
        self.can_hover
    }

    pub fn is_hovered(&self) -> bool {
        self.base.is_hovered()
    }

    pub fn is_alpha_pixel_hovered(&self) -> bool {
        self.tester.borrow().is_alpha_pixel_hovered()
    }

    pub fn is_buffer_ready(&self) -> bool {
        self.tester.borrow().is_buffer_ready()
    }

    pub fn enqueued_loads(&self) -> usize {
        self.tester.borrow().loader().enqueued_loads()
    }

    pub fn current_geometry(&self) -> Geometry {
        *self.tester.borrow().geometry()
    }

    pub fn set_cursor(&mut self, cursor: Option<CursorIcon>) {
        self.cursor = cursor;
    }

    /// The cursor to show, only while the pointer is over an opaque pixel.
    pub fn cursor_query(&self) -> Option<CursorIcon> {
        if !self.is_hovered() {
            return None;
        }
        self.cursor
    }

    pub fn set_tooltip(&mut self, tooltip: Option<String>) {
        self.tooltip = tooltip;
    }

    pub fn tooltip(&self) -> Option<&str> {
        if !self.is_hovered() {
            return None;
        }
        self.tooltip.as_deref()
    }

    /// Opens or closes the hover gate. While open, the base button's hover is bound
    /// to the hit predicate and re-evaluated on every query.
    pub fn set_can_hover(&mut self, allow: bool) {
        if self.can_hover == allow {
            return;
        }
        self.can_hover = allow;

        let source: Box<dyn HoverSource> = if allow {
            let tester = Rc::downgrade(&self.tester);
            Box::new(PredicateHover::new(move || {
                tester
                    .upgrade()
                    .is_some_and(|tester| tester.try_borrow().is_ok_and(|t| t.hit_test()))
            }))
        } else {
            Box::new(ConstantHover(false))
        };
        self.base.set_hover(Some(source));

        self.try_detect_on_hovered();
    }

    pub fn on_mouse_enter(&mut self, geometry: &Geometry, event: &PointerEvent) {
        self.update_mouse_data(geometry, event);
        self.base.on_mouse_enter(geometry, event);
        trace!("pointer entered at {:?}", event.screen_position);

        self.tester.borrow_mut().try_update_raw_colors_once();

        self.set_can_hover(true);
    }

    pub fn on_mouse_move(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply {
        self.update_mouse_data(geometry, event);

        if !self.can_hover && self.hit_test() {
            // pointer reached an opaque pixel
            self.set_can_hover(true);
        }

        self.try_detect_on_hovered();

        self.base.on_mouse_move(geometry, event)
    }

    pub fn on_mouse_leave(&mut self, event: &PointerEvent) {
        self.tester.borrow_mut().update_pointer(event);
        self.base.on_mouse_leave(event);
        trace!("pointer left at {:?}", event.screen_position);

        if !self.hit_test() {
            self.set_can_hover(false);
        }
    }

    pub fn on_mouse_button_down(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply {
        self.update_mouse_data(geometry, event);

        if !self.is_hovered() {
            trace!("press over transparent pixel swallowed");
            return Reply::Unhandled;
        }

        self.base.on_mouse_button_down(geometry, event)
    }

    pub fn on_mouse_button_double_click(
        &mut self,
        geometry: &Geometry,
        event: &PointerEvent,
    ) -> Reply {
        self.update_mouse_data(geometry, event);

        if !self.is_hovered() {
            trace!("double click over transparent pixel swallowed");
            return Reply::Unhandled;
        }

        self.base.on_mouse_button_double_click(geometry, event)
    }

    pub fn on_mouse_button_up(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply {
        self.update_mouse_data(geometry, event);

        let reply = if self.is_hovered() {
            self.base.on_mouse_button_up(geometry, event)
        } else {
            Reply::Unhandled
        };

        // A release always re-arms: hover has to be earned again by the next move.
        self.set_can_hover(false);

        reply
    }

    pub fn tick(&mut self, _delta_seconds: f32) {
        self.tick_detect_mouse_leave();
    }

    fn tick_detect_mouse_leave(&mut self) {
        let (geometry_is_empty, event) = {
            let tester = self.tester.borrow();
            (tester.geometry().has_zero_size(), *tester.event())
        };
        if self.can_hover && geometry_is_empty {
            trace!("no pointer events this frame, treating as leave");
            self.on_mouse_leave(&event);
        }

        // Refreshed by the next pointer event; still empty next tick means we lost it.
        self.tester.borrow_mut().reset_geometry();
    }

    fn try_detect_on_hovered(&mut self) {
        let hovered_now = self.can_hover && self.base.is_hovered();
        if self.is_hovered_cached != hovered_now {
            self.base.execute_hover_state_changed(hovered_now);
        }
        self.is_hovered_cached = hovered_now;
    }

    fn hit_test(&self) -> bool {
        self.tester.borrow().hit_test()
    }

    fn update_mouse_data(&mut self, geometry: &Geometry, event: &PointerEvent) {
        self.tester.borrow_mut().update_mouse_data(geometry, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ImmediateCopyQueue;
    use crate::texture::RasterTexture;
    use crate::utils::{Position, Rectangle, Size};

    fn quadrant_texture() -> Arc<dyn HitTexture> {
        Arc::new(RasterTexture::from_alpha_mask(2, 2, &[0, 0, 255, 255]).unwrap())
    }

    fn tester_with_buffer(threshold: u8) -> AlphaHitTester {
        let mut tester = AlphaHitTester::new(Arc::new(ImmediateCopyQueue));
        let texture = quadrant_texture();
        tester.set_source_texture(&texture);
        tester.set_alpha_threshold(threshold);
        assert_eq!(tester.try_update_raw_colors_once(), LoadRequest::Enqueued);
        // the texture Arc may drop now, the buffer is already published
        tester
    }

    fn sample(tester: &mut AlphaHitTester, x: f32, y: f32) -> bool {
        let geometry = Geometry::new(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        tester.update_mouse_data(&geometry, &PointerEvent::at(x, y));
        tester.is_alpha_pixel_hovered()
    }

    #[test]
    fn quadrant_example() {
        let mut tester = tester_with_buffer(10);
        assert!(sample(&mut tester, 75.0, 75.0));
        assert!(!sample(&mut tester, 25.0, 25.0));
    }

    #[test]
    fn threshold_is_exclusive() {
        let texture: Arc<dyn HitTexture> =
            Arc::new(RasterTexture::from_alpha_mask(2, 1, &[10, 11]).unwrap());
        let mut tester = AlphaHitTester::new(Arc::new(ImmediateCopyQueue));
        tester.set_source_texture(&texture);
        tester.set_alpha_threshold(10);
        tester.try_update_raw_colors_once();
        assert!(!sample(&mut tester, 25.0, 50.0));
        assert!(sample(&mut tester, 75.0, 50.0));
    }

    #[test]
    fn zero_threshold_disables_alpha_but_keeps_rectangle() {
        let mut tester = tester_with_buffer(0);
        assert!(!sample(&mut tester, 75.0, 75.0));
        assert!(tester.hit_test());
        tester.update_pointer(&PointerEvent::at(150.0, 10.0));
        assert!(!tester.hit_test());
    }

    #[test]
    fn offset_and_scaled_geometry_maps_through_absolute_to_local() {
        let mut tester = tester_with_buffer(10);
        // local 100x100 drawn at 2x from (200, 100)
        let geometry = Geometry::scaled(Position::new(200.0, 100.0), Size::new(100.0, 100.0), 2.0);
        tester.update_mouse_data(&geometry, &PointerEvent::at(200.0 + 150.0, 100.0 + 150.0));
        assert!(tester.is_alpha_pixel_hovered());
        tester.update_mouse_data(&geometry, &PointerEvent::at(200.0 + 50.0, 100.0 + 50.0));
        assert!(!tester.is_alpha_pixel_hovered());
    }

    #[test]
    fn empty_geometry_is_never_opaque() {
        let mut tester = tester_with_buffer(10);
        sample(&mut tester, 75.0, 75.0);
        tester.reset_geometry();
        assert!(!tester.is_alpha_pixel_hovered());
    }

    #[test]
    fn same_texture_again_keeps_the_buffer() {
        let mut tester = AlphaHitTester::new(Arc::new(ImmediateCopyQueue));
        let texture = quadrant_texture();
        tester.set_source_texture(&texture);
        tester.try_update_raw_colors_once();
        tester.set_source_texture(&texture);
        assert!(tester.is_buffer_ready());
        assert_eq!(tester.loader().enqueued_loads(), 1);
    }

    #[test]
    fn switching_texture_after_load_reloads() {
        let mut tester = AlphaHitTester::new(Arc::new(ImmediateCopyQueue));
        let first = quadrant_texture();
        let second: Arc<dyn HitTexture> =
            Arc::new(RasterTexture::from_alpha_mask(1, 1, &[255]).unwrap());
        tester.set_source_texture(&first);
        tester.try_update_raw_colors_once();
        tester.set_source_texture(&second);
        assert_eq!(tester.loader().enqueued_loads(), 2);
        assert_eq!(tester.loader().texture_key(), Some(second.texture_key()));
    }

    #[test]
    fn no_texture_means_no_load() {
        let mut tester = AlphaHitTester::new(Arc::new(ImmediateCopyQueue));
        assert_eq!(tester.try_update_raw_colors_once(), LoadRequest::Skipped);
        assert!(!sample(&mut tester, 75.0, 75.0));
    }
}
