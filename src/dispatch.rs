use crate::button::{BaseButton, Reply};
use crate::shape_button::AlphaHitButton;
use crate::utils::{Geometry, PointerEvent};
use shape_button_input::PointerState;

/// One event as a UI framework would deliver it to a single widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerDispatch {
    Entered(PointerEvent),
    Moved(PointerEvent),
    Pressed(PointerEvent),
    DoubleClicked(PointerEvent),
    Released(PointerEvent),
    Left(PointerEvent),
    Tick(f32),
}

/// Derives per-widget tick/enter/move/press/release/leave events from frame-sampled
/// pointer state.
///
/// The frame's `Tick` goes out first, so the widget checks and clears last frame's
/// pointer sample before this frame's events refresh it; between frames the sample
/// always describes the latest pointer position. A move is synthesised every frame
/// the pointer rests over the widget, so a widget that hears nothing for a whole
/// frame can assume the pointer is gone. While occluded the widget receives no
/// pointer events at all, not even a leave.
#[derive(Debug, Clone)]
pub struct PointerDispatcher {
    geometry: Geometry,
    inside: bool,
    occluded: bool,
}

impl PointerDispatcher {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            inside: false,
            occluded: false,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    pub fn set_occluded(&mut self, occluded: bool) {
        self.occluded = occluded;
    }

    pub fn is_occluded(&self) -> bool {
        self.occluded
    }

    pub fn dispatch(&mut self, input: &PointerState, delta_seconds: f32) -> Vec<PointerDispatch> {
        let event = PointerEvent::at(input.mouse_x, input.mouse_y);
        let mut events = vec![PointerDispatch::Tick(delta_seconds)];

        let over = !self.occluded && self.geometry.contains_absolute(event.screen_position);
        if over {
            if !self.inside {
                self.inside = true;
                events.push(PointerDispatch::Entered(event));
            }
            events.push(PointerDispatch::Moved(event));
            if input.lmb_just_pressed {
                if input.double_clicked {
                    events.push(PointerDispatch::DoubleClicked(event));
                } else {
                    events.push(PointerDispatch::Pressed(event));
                }
            }
            if input.lmb_just_released {
                events.push(PointerDispatch::Released(event));
            }
        } else if self.inside {
            self.inside = false;
            if !self.occluded {
                events.push(PointerDispatch::Left(event));
            }
        }

        events
    }
}

/// Feeds one dispatched event into `button`. Enter, leave and tick carry no reply
/// and report `Unhandled`.
pub fn deliver<B: BaseButton>(
    button: &mut AlphaHitButton<B>,
    geometry: &Geometry,
    dispatch: &PointerDispatch,
) -> Reply {
    match dispatch {
        PointerDispatch::Entered(event) => {
            button.on_mouse_enter(geometry, event);
            Reply::Unhandled
        }
        PointerDispatch::Moved(event) => button.on_mouse_move(geometry, event),
        PointerDispatch::Pressed(event) => button.on_mouse_button_down(geometry, event),
        PointerDispatch::DoubleClicked(event) => {
            button.on_mouse_button_double_click(geometry, event)
        }
        PointerDispatch::Released(event) => button.on_mouse_button_up(geometry, event),
        PointerDispatch::Left(event) => {
            button.on_mouse_leave(event);
            Reply::Unhandled
        }
        PointerDispatch::Tick(delta_seconds) => {
            button.tick(*delta_seconds);
            Reply::Unhandled
        }
    }
}
