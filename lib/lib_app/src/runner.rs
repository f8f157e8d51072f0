use std::{sync::Arc, time::Instant};

use gilrs::Gilrs;
use lib_gpu::{
    Device, DeviceDescriptor, Instance, PollType, Queue, RequestAdapterOptions, Surface,
    SurfaceConfiguration, SurfaceError, TextureViewDescriptor,
};
use lib_window::{
    ButtonCode, ButtonEvent, DeviceEvent,
    application::ApplicationHandler,
    event::{self, ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};
use tracing::{debug, error, info, warn};

use crate::{AppContext, AppError, AppEvent, AppFlow, AppHandler, DeviceId};

/// Runs `app` until it exits or aborts.
///
/// The app is dropped before this returns, on every path, so resources it
/// holds are released before the caller sees the result.
pub fn run_app<A: AppHandler>(app: A) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::EventLoop)?;

    let mut runner = Runner {
        app: Some(app),
        active: None,
        outcome: Ok(()),
    };

    event_loop
        .run_app(&mut runner)
        .map_err(AppError::EventLoop)?;

    drop(runner.app.take());

    runner.outcome
}

struct Runner<A: AppHandler> {
    app: Option<A>,
    active: Option<ActiveRunner>,
    outcome: Result<(), AppError>,
}

struct ActiveRunner {
    window: Arc<Window>,
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    gilrs: Option<Gilrs>,
    alt_left_is_held: bool,
    alt_right_is_held: bool,
    last_instant: Instant,
}

impl<A: AppHandler> Runner<A> {
    /// Applies `flow`; returns `false` when the loop is shutting down.
    fn apply(&mut self, event_loop: &ActiveEventLoop, flow: AppFlow) -> bool {
        match flow {
            AppFlow::Continue => true,
            AppFlow::Exit => {
                info!("application requested exit");
                event_loop.exit();
                false
            }
            AppFlow::Abort(err) => {
                debug!(error = %err, "application aborted");

                // Release everything the app holds before the loop winds down.
                drop(self.app.take());

                self.outcome = Err(AppError::Aborted(err));
                event_loop.exit();
                false
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!(error = %err, "startup failed");

        drop(self.app.take());

        self.outcome = Err(err);
        event_loop.exit();
    }
}

impl<A: AppHandler> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.active.is_some() {
            return;
        }
        let Some(app) = &self.app else {
            return;
        };

        let active = match ActiveRunner::new(event_loop, app) {
            Ok(active) => active,
            Err(err) => return self.fail(event_loop, err),
        };

        let Some(app) = &mut self.app else {
            return;
        };
        let flow = app.on_init(active.ctx());
        self.active = Some(active);

        self.apply(event_loop, flow);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(app), Some(active)) = (&mut self.app, &mut self.active) else {
            return;
        };

        let flow = active.poll_gamepad_events(app);
        if !self.apply(event_loop, flow) {
            return;
        }

        let (Some(app), Some(active)) = (&mut self.app, &mut self.active) else {
            return;
        };

        let now = Instant::now();
        let delta_time = now.duration_since(active.last_instant);
        active.last_instant = now;

        let flow = app.on_update(delta_time, active.ctx());
        if !self.apply(event_loop, flow) {
            return;
        }

        if let Some(active) = &self.active {
            active.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(app), Some(active)) = (&mut self.app, &mut self.active) else {
            return;
        };

        active.fsswitch_window_event(&event);

        let app_event = match &event {
            WindowEvent::CloseRequested => AppEvent::CloseRequested,
            WindowEvent::KeyboardInput {
                device_id,
                event,
                is_synthetic: _,
            } => AppEvent::Device {
                device: DeviceId::Winit(*device_id),
                event: DeviceEvent::Key(event),
            },
            WindowEvent::MouseInput {
                device_id,
                state,
                button,
            } => AppEvent::Device {
                device: DeviceId::Winit(*device_id),
                event: DeviceEvent::MouseButton {
                    button: *button,
                    is_held: *state == ElementState::Pressed,
                },
            },
            _ => AppEvent::UnhandledWindowEvent(&event),
        };

        let flow = app.on_event(app_event, active.ctx());
        if !self.apply(event_loop, flow) {
            return;
        }

        let (Some(app), Some(active)) = (&mut self.app, &mut self.active) else {
            return;
        };

        match &event {
            WindowEvent::RedrawRequested => {
                let Some(texture) = active.acquire_surface_texture() else {
                    return;
                };

                let flow = app.on_render(
                    &texture
                        .texture
                        .create_view(&TextureViewDescriptor::default()),
                    active.ctx(),
                );

                active.window.pre_present_notify();
                texture.present();

                if let Err(err) = active.device.poll(PollType::Poll) {
                    warn!(error = %err, "device poll failed");
                }

                self.apply(event_loop, flow);
            }
            WindowEvent::Resized(size) => {
                // Minimized windows report a zero size; keep the old surface.
                if size.width == 0 || size.height == 0 {
                    return;
                }

                active.surface_config.width = size.width;
                active.surface_config.height = size.height;

                active
                    .surface
                    .configure(&active.device, &active.surface_config);

                app.on_resize(size.width, size.height, active.ctx());
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        device_id: event::DeviceId,
        event: event::DeviceEvent,
    ) {
        let (Some(app), Some(active)) = (&mut self.app, &mut self.active) else {
            return;
        };

        let app_event = match &event {
            event::DeviceEvent::MouseMotion { delta: (dx, dy) } => AppEvent::Device {
                device: DeviceId::Winit(device_id),
                event: DeviceEvent::MouseMotion { dx: *dx, dy: *dy },
            },
            _ => AppEvent::UnhandledDeviceEvent {
                device: device_id,
                event: &event,
            },
        };

        let flow = app.on_event(app_event, active.ctx());
        self.apply(event_loop, flow);
    }
}

impl ActiveRunner {
    fn new(event_loop: &ActiveEventLoop, app: &impl AppHandler) -> Result<Self, AppError> {
        let window = Arc::new(
            event_loop
                .create_window(app.window_attributes())
                .map_err(AppError::Window)?,
        );

        let instance = Instance::default();

        let adapter =
            pollster::block_on(instance.request_adapter(&RequestAdapterOptions::default()))
                .map_err(AppError::Adapter)?;

        let adapter_info = adapter.get_info();
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "graphics adapter selected"
        );

        let (device, queue) =
            pollster::block_on(adapter.request_device(&DeviceDescriptor::default()))
                .map_err(AppError::Device)?;

        let surface = instance
            .create_surface(window.clone())
            .map_err(AppError::Surface)?;

        let surface_config = surface
            .get_default_config(
                &adapter,
                window.inner_size().width.max(1),
                window.inner_size().height.max(1),
            )
            .ok_or(AppError::SurfaceUnsupported)?;

        surface.configure(&device, &surface_config);

        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(err) => {
                warn!(error = %err, "gamepad support unavailable");
                None
            }
        };

        Ok(Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            gilrs,
            alt_left_is_held: false,
            alt_right_is_held: false,
            last_instant: Instant::now(),
        })
    }

    fn ctx(&self) -> AppContext<'_> {
        AppContext {
            window: &self.window,
            device: &self.device,
            queue: &self.queue,
            surface_format: self.surface_config.format,
            surface_size: (self.surface_config.width, self.surface_config.height),
        }
    }

    fn acquire_surface_texture(&mut self) -> Option<lib_gpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(texture) => Some(texture),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to acquire the next surface texture");
                None
            }
        }
    }

    fn fsswitch_window_event(&mut self, event: &WindowEvent) {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return;
        };

        if event.repeat {
            return;
        }

        let PhysicalKey::Code(keycode) = event.physical_key else {
            return;
        };

        match keycode {
            KeyCode::AltLeft => self.alt_left_is_held = event.state.is_pressed(),
            KeyCode::AltRight => self.alt_right_is_held = event.state.is_pressed(),

            KeyCode::Enter if event.state.is_pressed() => {
                if self.alt_left_is_held || self.alt_right_is_held {
                    match self.window.fullscreen() {
                        Some(_) => self.window.set_fullscreen(None),
                        None => self
                            .window
                            .set_fullscreen(Some(Fullscreen::Borderless(None))),
                    }
                }
            }

            _ => {}
        }
    }

    /// Forwards pending gamepad events; returns the first flow that is not
    /// [`AppFlow::Continue`].
    fn poll_gamepad_events(&mut self, app: &mut impl AppHandler) -> AppFlow {
        let Some(gilrs) = &mut self.gilrs else {
            return AppFlow::Continue;
        };

        let mut events = Vec::new();
        while let Some(event) = gilrs.next_event() {
            events.push(event);
        }

        for event in events {
            let device = DeviceId::Gilrs(event.id);
            let ctx = self.ctx();

            let flow = match event.event {
                gilrs::EventType::Connected => {
                    send_device_event(app, device, DeviceEvent::Connected, ctx)
                }
                gilrs::EventType::Disconnected => {
                    send_device_event(app, device, DeviceEvent::Disconnected, ctx)
                }
                gilrs::EventType::AxisChanged(axis, value, _) => {
                    let Some((positive, negative)) = ButtonCode::from_gilrs_axis(axis) else {
                        continue;
                    };

                    let positive = ButtonEvent {
                        button: positive,
                        value: value.max(0.0),
                    };
                    let negative = ButtonEvent {
                        button: negative,
                        value: (-value).max(0.0),
                    };

                    match send_device_event(app, device, DeviceEvent::Button(&positive), ctx) {
                        AppFlow::Continue => {
                            send_device_event(app, device, DeviceEvent::Button(&negative), ctx)
                        }
                        flow => flow,
                    }
                }
                gilrs::EventType::ButtonChanged(button, value, _) => {
                    let button = ButtonEvent {
                        button: ButtonCode::from_gilrs(button),
                        value,
                    };

                    send_device_event(app, device, DeviceEvent::Button(&button), ctx)
                }
                _ => AppFlow::Continue,
            };

            if !matches!(flow, AppFlow::Continue) {
                return flow;
            }
        }

        AppFlow::Continue
    }
}

fn send_device_event(
    app: &mut impl AppHandler,
    device: DeviceId,
    event: DeviceEvent<'_>,
    ctx: AppContext<'_>,
) -> AppFlow {
    app.on_event(AppEvent::Device { device, event }, ctx)
}
