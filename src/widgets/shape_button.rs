use crate::button::{BaseButton, Callback, ClickMethod, Reply, StandardButton};
use crate::config::{ConfigError, ShapeButtonConfig};
use crate::dispatch::{deliver, PointerDispatch, PointerDispatcher};
use crate::loader::CopyQueue;
use crate::shape_button::{AlphaHitButton, DEFAULT_ALPHA_THRESHOLD};
use crate::texture::HitTexture;
use crate::utils::{Geometry, Rectangle};
use shape_button_input::PointerState;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;
use winit::window::CursorIcon;

// Internal Representation
pub struct ShapeButtonInternal {
    id: Uuid,
    rect: Rectangle,
    widget: AlphaHitButton<StandardButton>,
    // Keeps the texture alive; the widget itself only holds it weakly.
    hit_texture: Option<Arc<dyn HitTexture>>,
    alpha_threshold: u8,
    dispatcher: PointerDispatcher,
}

impl ShapeButtonInternal {
    pub fn new(id: Uuid, rect: Rectangle, queue: Arc<dyn CopyQueue>) -> Self {
        let mut internal = Self {
            id,
            rect,
            widget: AlphaHitButton::new(StandardButton::new(), queue),
            hit_texture: None,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            dispatcher: PointerDispatcher::new(Geometry::new(rect)),
        };
        internal.synchronize_properties();
        internal
    }

    pub fn set_source_texture(&mut self, texture: Arc<dyn HitTexture>) {
        self.widget.set_source_texture(&texture);
        self.hit_texture = Some(texture);
    }

    pub fn set_alpha_threshold(&mut self, alpha_threshold: u8) {
        self.alpha_threshold = alpha_threshold;
        self.widget.set_alpha_threshold(alpha_threshold);
    }

    /// Pushes the stored settings into the widget. Clicks are always precise: press
    /// and release both have to land on opaque pixels.
    pub fn synchronize_properties(&mut self) {
        if let Some(ref texture) = self.hit_texture {
            self.widget.set_source_texture(texture);
        }
        self.widget.set_alpha_threshold(self.alpha_threshold);
        self.widget
            .base_mut()
            .set_click_method(ClickMethod::PreciseClick);
    }

    pub fn set_rect(&mut self, rect: Rectangle) {
        self.rect = rect;
        self.dispatcher.set_geometry(Geometry::new(rect));
    }

    pub fn update(
        &mut self,
        input: &PointerState,
        delta_seconds: f32,
    ) -> Vec<(PointerDispatch, Reply)> {
        let geometry = Geometry::new(self.rect);
        self.dispatcher
            .dispatch(input, delta_seconds)
            .into_iter()
            .map(|event| (event, deliver(&mut self.widget, &geometry, &event)))
            .collect()
    }
}

// Wrapper Representation
#[derive(Clone)]
pub struct ShapeButton {
    internal: Rc<RefCell<ShapeButtonInternal>>,
}

impl ShapeButton {
    pub fn new(rect: Rectangle, queue: Arc<dyn CopyQueue>) -> Self {
        Self {
            internal: Rc::new(RefCell::new(ShapeButtonInternal::new(
                Uuid::new_v4(),
                rect,
                queue,
            ))),
        }
    }

    pub fn from_config(config: &ShapeButtonConfig, rect: Rectangle) -> Result<Self, ConfigError> {
        let button = Self::new(rect, config.copy_queue.build());
        if let Some(texture) = config.load_texture()? {
            button.set_source_texture(texture);
        }
        button.set_alpha_threshold(config.alpha_threshold);
        button.set_cursor(config.cursor_icon()?);
        button.set_tooltip(config.tooltip.clone());
        button
            .internal
            .borrow_mut()
            .widget
            .base_mut()
            .set_is_focusable(config.is_focusable);
        Ok(button)
    }

    pub fn get_id(&self) -> Uuid {
        self.internal.borrow().id
    }

    pub fn get_rect(&self) -> Rectangle {
        self.internal.borrow().rect
    }

    pub fn set_rect(&self, rect: Rectangle) {
        self.internal.borrow_mut().set_rect(rect);
    }

    pub fn set_source_texture(&self, texture: Arc<dyn HitTexture>) {
        self.internal.borrow_mut().set_source_texture(texture);
    }

    pub fn set_alpha_threshold(&self, alpha_threshold: u8) {
        self.internal.borrow_mut().set_alpha_threshold(alpha_threshold);
    }

    pub fn synchronize_properties(&self) {
        self.internal.borrow_mut().synchronize_properties();
    }

    pub fn set_on_clicked(&self, callback: Option<Callback>) {
        self.with_base(|base| base.set_on_clicked(callback));
    }

    pub fn set_on_pressed(&self, callback: Option<Callback>) {
        self.with_base(|base| base.set_on_pressed(callback));
    }

    pub fn set_on_released(&self, callback: Option<Callback>) {
        self.with_base(|base| base.set_on_released(callback));
    }

    pub fn set_on_hovered(&self, callback: Option<Callback>) {
        self.with_base(|base| base.set_on_hovered(callback));
    }

    pub fn set_on_unhovered(&self, callback: Option<Callback>) {
        self.with_base(|base| base.set_on_unhovered(callback));
    }

    pub fn set_cursor(&self, cursor: Option<CursorIcon>) {
        self.internal.borrow_mut().widget.set_cursor(cursor);
    }

    pub fn set_tooltip(&self, tooltip: Option<String>) {
        self.internal.borrow_mut().widget.set_tooltip(tooltip);
    }

    pub fn cursor_query(&self) -> Option<CursorIcon> {
        self.internal.borrow().widget.cursor_query()
    }

    pub fn tooltip(&self) -> Option<String> {
        self.internal.borrow().widget.tooltip().map(str::to_string)
    }

    pub fn set_occluded(&self, occluded: bool) {
        self.internal.borrow_mut().dispatcher.set_occluded(occluded);
    }

    pub fn is_hovered(&self) -> bool {
        self.internal.borrow().widget.is_hovered()
    }

    pub fn can_hover(&self) -> bool {
        self.internal.borrow().widget.can_hover()
    }

    pub fn is_pressed(&self) -> bool {
        self.internal.borrow().widget.base().is_pressed()
    }

    pub fn is_buffer_ready(&self) -> bool {
        self.internal.borrow().widget.is_buffer_ready()
    }

    pub fn click_method(&self) -> ClickMethod {
        self.internal.borrow().widget.base().click_method()
    }

    pub fn is_focusable(&self) -> bool {
        self.internal.borrow().widget.base().is_focusable()
    }

    /// Runs one frame of pointer input through the widget.
    ///
    /// Callbacks fire while the button is borrowed, so they must not call back into
    /// this `ShapeButton`.
    pub fn update(
        &self,
        input: &PointerState,
        delta_seconds: f32,
    ) -> Vec<(PointerDispatch, Reply)> {
        self.internal.borrow_mut().update(input, delta_seconds)
    }

    fn with_base(&self, f: impl FnOnce(&mut StandardButton)) {
        f(self.internal.borrow_mut().widget.base_mut());
    }
}
