use winit::event::{KeyEvent, MouseButton};

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Winit(winit::event::DeviceId),
    Gilrs(gilrs::GamepadId),
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub enum DeviceEvent<'a> {
    Connected,
    Disconnected,
    Key(&'a KeyEvent),
    Button(&'a ButtonEvent),
    /// Raw, unaccelerated mouse movement in device counts.
    MouseMotion { dx: f64, dy: f64 },
    MouseButton { button: MouseButton, is_held: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct ButtonEvent {
    pub button: ButtonCode,
    pub value: f32,
}

/// Gamepad inputs the demo reacts to. Stick axes are split into one
/// half-axis button per direction with a value in `0.0..=1.0`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonCode {
    LeftStickRight,
    LeftStickLeft,
    LeftStickUp,
    LeftStickDown,
    RightStickRight,
    RightStickLeft,
    RightStickUp,
    RightStickDown,
    LeftTrigger2,
    RightTrigger2,
    South,
    Start,
    Unknown,
}

impl ButtonCode {
    pub fn from_gilrs(button: gilrs::Button) -> Self {
        match button {
            gilrs::Button::LeftTrigger2 => Self::LeftTrigger2,
            gilrs::Button::RightTrigger2 => Self::RightTrigger2,
            gilrs::Button::South => Self::South,
            gilrs::Button::Start => Self::Start,
            _ => Self::Unknown,
        }
    }

    /// Returns the `(positive, negative)` half-axis pair for a stick axis.
    pub fn from_gilrs_axis(axis: gilrs::Axis) -> Option<(Self, Self)> {
        match axis {
            gilrs::Axis::LeftStickX => Some((Self::LeftStickRight, Self::LeftStickLeft)),
            gilrs::Axis::LeftStickY => Some((Self::LeftStickUp, Self::LeftStickDown)),
            gilrs::Axis::RightStickX => Some((Self::RightStickRight, Self::RightStickLeft)),
            gilrs::Axis::RightStickY => Some((Self::RightStickUp, Self::RightStickDown)),
            _ => None,
        }
    }
}
