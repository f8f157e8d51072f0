use std::{error::Error, time::Duration};

use lib_gpu::{
    CreateSurfaceError, Device, Queue, RequestAdapterError, RequestDeviceError, TextureFormat,
    TextureView,
};
use lib_window::{
    DeviceEvent, DeviceId, Window, WindowAttributes,
    error::{EventLoopError, OsError},
};

mod runner;

pub use runner::run_app;

/// Error type carried by [`AppFlow::Abort`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The application driven by [`run_app`].
///
/// The runner owns the window, the graphics device and the frame loop and
/// calls into the handler once initialization succeeded: `on_init` first,
/// then `on_update` and `on_render` once per frame, with `on_resize` and
/// `on_event` in between as the window reports them.
pub trait AppHandler {
    fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default().with_title("Untitled App")
    }

    fn on_init(&mut self, _ctx: AppContext<'_>) -> AppFlow {
        AppFlow::Continue
    }

    fn on_update(&mut self, _delta_time: Duration, _ctx: AppContext<'_>) -> AppFlow {
        AppFlow::Continue
    }

    /// Draws one frame into the window's surface texture.
    fn on_render(&mut self, output: &TextureView, ctx: AppContext<'_>) -> AppFlow;

    fn on_resize(&mut self, _width: u32, _height: u32, _ctx: AppContext<'_>) {}

    fn on_event(&mut self, event: AppEvent<'_>, _ctx: AppContext<'_>) -> AppFlow {
        match event {
            AppEvent::CloseRequested => AppFlow::Exit,
            _ => AppFlow::Continue,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AppContext<'a> {
    pub window: &'a Window,
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub surface_format: TextureFormat,
    pub surface_size: (u32, u32),
}

#[derive(Debug)]
pub enum AppFlow {
    Continue,
    Exit,
    /// Stops the loop, drops the app and makes [`run_app`] fail with
    /// [`AppError::Aborted`].
    Abort(BoxError),
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub enum AppEvent<'a> {
    CloseRequested,
    Device {
        device: DeviceId,
        event: DeviceEvent<'a>,
    },
    UnhandledWindowEvent(&'a lib_window::event::WindowEvent),
    UnhandledDeviceEvent {
        device: lib_window::event::DeviceId,
        event: &'a lib_window::event::DeviceEvent,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to create the event loop")]
    EventLoop(#[source] EventLoopError),
    #[error("failed to create the main window")]
    Window(#[source] OsError),
    #[error("no suitable graphics adapter")]
    Adapter(#[source] RequestAdapterError),
    #[error("failed to open the graphics device")]
    Device(#[source] RequestDeviceError),
    #[error("failed to create the window surface")]
    Surface(#[source] CreateSurfaceError),
    #[error("the window surface is not supported by the graphics adapter")]
    SurfaceUnsupported,
    #[error("application aborted")]
    Aborted(#[source] BoxError),
}

impl AppFlow {
    pub fn abort(error: impl Into<BoxError>) -> Self {
        Self::Abort(error.into())
    }
}
