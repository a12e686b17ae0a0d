#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Per-frame pointer state with edge detection for the primary button.
#[derive(Default, Debug, Clone)]
pub struct PointerState {
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub lmb_down: bool,
    pub lmb_just_pressed: bool,
    pub lmb_just_released: bool,
    pub double_clicked: bool,
    prev_lmb_down: bool,
}

impl PointerState {
    pub fn update(&mut self, x: f32, y: f32, lmb_down_now: bool) {
        self.mouse_x = x;
        self.mouse_y = y;
        self.lmb_just_pressed = lmb_down_now && !self.prev_lmb_down;
        self.lmb_just_released = !lmb_down_now && self.prev_lmb_down;
        self.lmb_down = lmb_down_now;
        self.prev_lmb_down = lmb_down_now;
        self.double_clicked = false;
    }

    // A double click is reported by the platform on top of a regular press edge.
    pub fn mark_double_click(&mut self) {
        self.double_clicked = self.lmb_just_pressed;
    }

    pub fn position(&self) -> (f32, f32) {
        (self.mouse_x, self.mouse_y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PointerRecord {
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub lmb_down: bool,
    #[serde(default)]
    pub double_click: bool,
    // Another widget covers the target this frame, so it receives no pointer events.
    #[serde(default)]
    pub occluded: bool,
}

impl PointerRecord {
    pub fn at(mouse_x: f32, mouse_y: f32, lmb_down: bool) -> Self {
        Self {
            mouse_x,
            mouse_y,
            lmb_down,
            ..Default::default()
        }
    }

    pub fn from_state(input: &PointerState) -> Self {
        Self {
            mouse_x: input.mouse_x,
            mouse_y: input.mouse_y,
            lmb_down: input.lmb_down,
            double_click: input.double_clicked,
            occluded: false,
        }
    }

    pub fn apply_to(&self, input: &mut PointerState) {
        input.update(self.mouse_x, self.mouse_y, self.lmb_down);
        if self.double_click {
            input.mark_double_click();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayScript {
    pub frames: Vec<PointerRecord>,
    #[serde(default = "default_frame_seconds")]
    pub frame_seconds: f32,
}

fn default_frame_seconds() -> f32 {
    1.0 / 60.0
}

impl ReplayScript {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
