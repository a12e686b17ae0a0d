use crate::hover::HoverSource;
use crate::utils::{Geometry, MouseButton, PointerEvent};
use log::trace;
use serde::{Deserialize, Serialize};

pub type Callback = Box<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Handled,
    Unhandled,
}

impl Reply {
    pub fn is_handled(self) -> bool {
        self == Reply::Handled
    }
}

/// When a press turns into a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClickMethod {
    /// Press inside, release inside.
    #[default]
    DownAndUp,
    /// Click as soon as the button goes down.
    MouseDown,
    /// Click on any release inside the button.
    MouseUp,
    /// Press and release must both happen while the button reports itself hovered.
    PreciseClick,
}

/// The clickable-widget behaviour a hit-testing button specialises.
pub trait BaseButton {
    fn on_mouse_enter(&mut self, geometry: &Geometry, event: &PointerEvent);
    fn on_mouse_leave(&mut self, event: &PointerEvent);
    fn on_mouse_move(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply;
    fn on_mouse_button_down(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply;
    fn on_mouse_button_double_click(&mut self, geometry: &Geometry, event: &PointerEvent)
        -> Reply;
    fn on_mouse_button_up(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply;

    fn is_hovered(&self) -> bool;
    fn is_pressed(&self) -> bool;
    /// Overrides enter/leave tracking with `source`; `None` restores it.
    fn set_hover(&mut self, source: Option<Box<dyn HoverSource>>);
    /// Plays the hovered or unhovered notification.
    fn execute_hover_state_changed(&mut self, hovered: bool);

    fn click_method(&self) -> ClickMethod;
    fn set_click_method(&mut self, click_method: ClickMethod);
    fn is_focusable(&self) -> bool;
    fn set_is_focusable(&mut self, focusable: bool);
}

/// Rectangular button with the usual click, press, release and hover callbacks.
#[derive(Default)]
pub struct StandardButton {
    native_hovered: bool,
    hover_source: Option<Box<dyn HoverSource>>,
    pressed: bool,
    click_method: ClickMethod,
    is_focusable: bool,
    on_clicked: Option<Callback>,
    on_pressed: Option<Callback>,
    on_released: Option<Callback>,
    on_hovered: Option<Callback>,
    on_unhovered: Option<Callback>,
}

impl StandardButton {
    pub fn new() -> Self {
        Self {
            is_focusable: true,
            ..Default::default()
        }
    }

    pub fn set_on_clicked(&mut self, callback: Option<Callback>) {
        self.on_clicked = callback;
    }

    pub fn set_on_pressed(&mut self, callback: Option<Callback>) {
        self.on_pressed = callback;
    }

    pub fn set_on_released(&mut self, callback: Option<Callback>) {
        self.on_released = callback;
    }

    pub fn set_on_hovered(&mut self, callback: Option<Callback>) {
        self.on_hovered = callback;
    }

    pub fn set_on_unhovered(&mut self, callback: Option<Callback>) {
        self.on_unhovered = callback;
    }

    fn fire(callback: &Option<Callback>) {
        if let Some(ref callback) = callback {
            callback();
        }
    }

    fn press(&mut self) {
        if !self.pressed {
            self.pressed = true;
            Self::fire(&self.on_pressed);
        }
    }

    fn release(&mut self) {
        if self.pressed {
            self.pressed = false;
            Self::fire(&self.on_released);
        }
    }

    fn click(&self) {
        trace!("button clicked");
        Self::fire(&self.on_clicked);
    }
}

impl BaseButton for StandardButton {
    fn on_mouse_enter(&mut self, _geometry: &Geometry, _event: &PointerEvent) {
        let was_hovered = self.is_hovered();
        self.native_hovered = true;
        // With a hover source installed the owner decides when to notify.
        if self.hover_source.is_none() && !was_hovered {
            self.execute_hover_state_changed(true);
        }
    }

    fn on_mouse_leave(&mut self, _event: &PointerEvent) {
        let was_hovered = self.is_hovered();
        self.native_hovered = false;
        if self.click_method == ClickMethod::PreciseClick {
            self.release();
        }
        if self.hover_source.is_none() && was_hovered {
            self.execute_hover_state_changed(false);
        }
    }

    fn on_mouse_move(&mut self, _geometry: &Geometry, _event: &PointerEvent) -> Reply {
        Reply::Unhandled
    }

    fn on_mouse_button_down(&mut self, _geometry: &Geometry, event: &PointerEvent) -> Reply {
        if event.button != MouseButton::Left {
            return Reply::Unhandled;
        }
        match self.click_method {
            ClickMethod::MouseDown => {
                self.press();
                self.click();
                self.release();
            }
            _ => self.press(),
        }
        Reply::Handled
    }

    fn on_mouse_button_double_click(
        &mut self,
        geometry: &Geometry,
        event: &PointerEvent,
    ) -> Reply {
        self.on_mouse_button_down(geometry, event)
    }

    fn on_mouse_button_up(&mut self, geometry: &Geometry, event: &PointerEvent) -> Reply {
        if event.button != MouseButton::Left {
            return Reply::Unhandled;
        }
        let was_pressed = self.pressed;
        let inside = geometry.contains_absolute(event.screen_position);
        let should_click = match self.click_method {
            ClickMethod::MouseDown => false,
            ClickMethod::DownAndUp => was_pressed && inside,
            ClickMethod::MouseUp => inside,
            ClickMethod::PreciseClick => was_pressed && self.is_hovered(),
        };
        self.release();
        if should_click {
            self.click();
        }
        if was_pressed || should_click {
            Reply::Handled
        } else {
            Reply::Unhandled
        }
    }

    fn is_hovered(&self) -> bool {
        match self.hover_source {
            Some(ref source) => source.is_hovered(),
            None => self.native_hovered,
        }
    }

    fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn set_hover(&mut self, source: Option<Box<dyn HoverSource>>) {
        self.hover_source = source;
    }

    fn execute_hover_state_changed(&mut self, hovered: bool) {
        trace!("button hover changed: {hovered}");
        if hovered {
            Self::fire(&self.on_hovered);
        } else {
            Self::fire(&self.on_unhovered);
        }
    }

    fn click_method(&self) -> ClickMethod {
        self.click_method
    }

    fn set_click_method(&mut self, click_method: ClickMethod) {
        self.click_method = click_method;
    }

    fn is_focusable(&self) -> bool {
        self.is_focusable
    }

    fn set_is_focusable(&mut self, focusable: bool) {
        self.is_focusable = focusable;
    }
}
