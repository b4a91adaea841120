use crate::core::geo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Input events fed to a map view, in host coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Primary button pressed; starts a drag
    PointerDown { position: Point },
    /// Pointer moved; pans only while dragging
    PointerMove { position: Point },
    /// Primary button released; ends the drag
    PointerUp,
    /// Scroll wheel, positive delta zooms out
    Wheel { delta: f64 },
    /// Container resized
    Resize { size: Size },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        InputEvent::PointerDown {
            position: Point::new(x, y),
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        InputEvent::PointerMove {
            position: Point::new(x, y),
        }
    }

    pub fn wheel(delta: f64) -> Self {
        InputEvent::Wheel { delta }
    }

    pub fn resize(width: u32, height: u32) -> Self {
        InputEvent::Resize {
            size: Size::new(width, height),
        }
    }
}
