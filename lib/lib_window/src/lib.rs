pub use winit::{
    application, dpi, error, event, event_loop, keyboard,
    keyboard::{KeyCode, PhysicalKey},
    window,
    window::{Window, WindowAttributes},
};

mod input;
pub use input::*;
