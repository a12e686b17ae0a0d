use std::ops::{Div, Mul, Sub};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, Default, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(a: u8) -> Self {
        Self { r: 255, g: 255, b: 255, a }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension collapses, which also guards the
    /// normalisation divide in hit testing.
    pub fn is_zero(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn floor(self) -> Self {
        Self {
            x: self.x.floor(),
            y: self.y.floor(),
        }
    }
}

impl Sub for Position {
    type Output = Position;
    fn sub(self, rhs: Position) -> Self::Output {
        Position {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Position {
    type Output = Position;
    fn mul(self, factor: f32) -> Self::Output {
        Position {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl Div<f32> for Position {
    type Output = Position;
    fn div(self, divisor: f32) -> Self::Output {
        Position {
            x: self.x / divisor,
            y: self.y / divisor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    // Half-open on the far edges so adjacent widgets never both claim a point.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.x
            && position.x < self.x + self.width
            && position.y >= self.y
            && position.y < self.y + self.height
    }

    pub fn pos(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

/// A widget's on-screen placement for one frame: where its local origin sits in
/// absolute (screen) space, its size in local units, and the local-to-absolute scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub absolute_position: Position,
    pub local_size: Size,
    pub scale: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Geometry {
    pub fn new(rect: Rectangle) -> Self {
        Self {
            absolute_position: rect.pos(),
            local_size: rect.size(),
            scale: 1.0,
        }
    }

    pub fn scaled(absolute_position: Position, local_size: Size, scale: f32) -> Self {
        Self {
            absolute_position,
            local_size,
            scale,
        }
    }

    /// The "nothing observed this frame" sentinel.
    pub const fn empty() -> Self {
        Self {
            absolute_position: Position { x: 0.0, y: 0.0 },
            local_size: Size {
                width: 0.0,
                height: 0.0,
            },
            scale: 1.0,
        }
    }

    pub fn local_size(&self) -> Size {
        self.local_size
    }

    pub fn has_zero_size(&self) -> bool {
        self.local_size.is_zero()
    }

    pub fn absolute_to_local(&self, absolute: Position) -> Position {
        let offset = absolute - self.absolute_position;
        if self.scale == 0.0 {
            return offset;
        }
        offset / self.scale
    }

    pub fn contains_absolute(&self, absolute: Position) -> bool {
        let local = self.absolute_to_local(absolute);
        Rectangle::new(0.0, 0.0, self.local_size.width, self.local_size.height).contains(local)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            winit::event::MouseButton::Back => MouseButton::Other(3),
            winit::event::MouseButton::Forward => MouseButton::Other(4),
            winit::event::MouseButton::Other(id) => MouseButton::Other(id),
        }
    }
}

/// Cursor event as delivered by the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub screen_position: Position,
    pub button: MouseButton,
}

impl Default for PointerEvent {
    fn default() -> Self {
        Self {
            screen_position: Position::default(),
            button: MouseButton::Left,
        }
    }
}

impl PointerEvent {
    pub fn new(screen_position: Position, button: MouseButton) -> Self {
        Self {
            screen_position,
            button,
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(Position::new(x, y), MouseButton::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_half_open() {
        let rect = Rectangle::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Position::new(10.0, 10.0)));
        assert!(rect.contains(Position::new(29.9, 29.9)));
        assert!(!rect.contains(Position::new(30.0, 15.0)));
        assert!(!rect.contains(Position::new(15.0, 9.9)));
    }

    #[test]
    fn absolute_to_local_undoes_offset_and_scale() {
        let geometry = Geometry::scaled(Position::new(100.0, 50.0), Size::new(40.0, 20.0), 2.0);
        assert_eq!(
            geometry.absolute_to_local(Position::new(140.0, 70.0)),
            Position::new(20.0, 10.0)
        );
        assert!(geometry.contains_absolute(Position::new(179.0, 89.0)));
        assert!(!geometry.contains_absolute(Position::new(180.0, 60.0)));
    }

    #[test]
    fn empty_geometry_has_zero_size() {
        assert!(Geometry::empty().has_zero_size());
        assert!(Geometry::default().has_zero_size());
        assert!(Geometry::new(Rectangle::new(0.0, 0.0, 0.0, 10.0)).has_zero_size());
        assert!(!Geometry::new(Rectangle::new(0.0, 0.0, 1.0, 1.0)).has_zero_size());
    }

    #[test]
    fn winit_buttons_map_across() {
        assert_eq!(MouseButton::from(winit::event::MouseButton::Left), MouseButton::Left);
        assert_eq!(MouseButton::from(winit::event::MouseButton::Back), MouseButton::Other(3));
    }
}
