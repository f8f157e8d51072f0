use std::collections::HashSet;

use lib_math::{Vec2, Vec3, vec2, vec3};
use lib_window::{
    ButtonCode, ButtonEvent, DeviceEvent, KeyCode, PhysicalKey, event::ElementState,
    event::MouseButton,
};

use crate::camera::Camera;

/// Stick deflection below which input is ignored.
const STICK_DEAD_ZONE: f32 = 0.15;

/// Turns keyboard, mouse and gamepad events into camera motion.
#[derive(Debug, Default)]
pub struct Controls {
    held_keys: HashSet<KeyCode>,
    pressed_keys: HashSet<KeyCode>,
    sticks: StickHandler,
    left_trigger: f32,
    right_trigger: f32,
    south_pressed: bool,
    start_pressed: bool,
    mouse_look: bool,
    mouse_delta: Vec2,
}

/// Input gathered since the previous [`Controls::next_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlsFrame {
    /// `x` right, `y` up, `z` forward, each in `-1.0..=1.0`.
    pub movement: Vec3,
    /// `x` turns left, `y` looks up, each in `-1.0..=1.0`.
    pub look: Vec2,
    /// Mouse counts moved while looking with the mouse.
    pub mouse: Vec2,
    pub recenter: bool,
    pub exit: bool,
}

#[derive(Debug, Default)]
struct StickHandler {
    left_stick_right: f32,
    left_stick_left: f32,
    left_stick_up: f32,
    left_stick_down: f32,
    right_stick_right: f32,
    right_stick_left: f32,
    right_stick_up: f32,
    right_stick_down: f32,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&mut self, event: DeviceEvent<'_>) {
        match event {
            DeviceEvent::Key(key) => {
                if let PhysicalKey::Code(code) = key.physical_key {
                    self.key(code, key.state == ElementState::Pressed);
                }
            }
            DeviceEvent::Button(button) => self.button(button),
            DeviceEvent::MouseButton {
                button: MouseButton::Right,
                is_held,
            } => self.mouse_look = is_held,
            DeviceEvent::MouseMotion { dx, dy } if self.mouse_look => {
                self.mouse_delta += vec2(dx as f32, dy as f32);
            }
            DeviceEvent::Disconnected => {
                self.sticks = StickHandler::default();
                self.left_trigger = 0.0;
                self.right_trigger = 0.0;
            }
            _ => {}
        }
    }

    pub fn key(&mut self, code: KeyCode, is_held: bool) {
        if is_held {
            if self.held_keys.insert(code) {
                self.pressed_keys.insert(code);
            }
        } else {
            self.held_keys.remove(&code);
        }
    }

    pub fn button(&mut self, event: &ButtonEvent) {
        match event.button {
            ButtonCode::LeftTrigger2 => self.left_trigger = event.value,
            ButtonCode::RightTrigger2 => self.right_trigger = event.value,
            ButtonCode::South => self.south_pressed |= event.value >= 0.5,
            ButtonCode::Start => self.start_pressed |= event.value >= 0.5,
            ButtonCode::Unknown => {}
            code => self.sticks.event(code, event.value),
        }
    }

    /// Collects the input of the frame and resets everything that only
    /// lasts one frame.
    pub fn next_frame(&mut self) -> ControlsFrame {
        let key_axis = |positive, negative| {
            self.held_keys.contains(&positive) as i8 as f32
                - self.held_keys.contains(&negative) as i8 as f32
        };

        let left_stick = dead_zone(self.sticks.left_stick());
        let right_stick = dead_zone(self.sticks.right_stick());

        let movement = vec3(
            key_axis(KeyCode::KeyD, KeyCode::KeyA) + left_stick.x,
            key_axis(KeyCode::KeyE, KeyCode::KeyQ) + self.right_trigger - self.left_trigger,
            key_axis(KeyCode::KeyW, KeyCode::KeyS) + left_stick.y,
        )
        .clamp(Vec3::NEG_ONE, Vec3::ONE);

        let look = vec2(
            key_axis(KeyCode::ArrowLeft, KeyCode::ArrowRight) - right_stick.x,
            key_axis(KeyCode::ArrowUp, KeyCode::ArrowDown) + right_stick.y,
        )
        .clamp(Vec2::NEG_ONE, Vec2::ONE);

        let frame = ControlsFrame {
            movement,
            look,
            mouse: self.mouse_delta,
            recenter: self.pressed_keys.contains(&KeyCode::KeyR) || self.south_pressed,
            exit: self.pressed_keys.contains(&KeyCode::Escape) || self.start_pressed,
        };

        self.pressed_keys.clear();
        self.mouse_delta = Vec2::ZERO;
        self.south_pressed = false;
        self.start_pressed = false;

        frame
    }
}

impl ControlsFrame {
    /// Moves and turns `camera` for a frame lasting `delta_seconds`, then
    /// refreshes its matrices.
    pub fn apply(&self, camera: &mut Camera, delta_seconds: f32) {
        let look_step = camera.look_speed.to_radians() * delta_seconds;
        let mouse_step = camera.mouse_sensitivity.to_radians();

        camera.yaw(self.look.x * look_step - self.mouse.x * mouse_step);
        camera.pitch(self.look.y * look_step - self.mouse.y * mouse_step);
        camera.move_local(self.movement * camera.movement_speed * delta_seconds);

        camera.update_matrices();
    }
}

impl StickHandler {
    fn event(&mut self, code: ButtonCode, value: f32) {
        match code {
            ButtonCode::LeftStickRight => self.left_stick_right = value,
            ButtonCode::LeftStickLeft => self.left_stick_left = value,
            ButtonCode::LeftStickUp => self.left_stick_up = value,
            ButtonCode::LeftStickDown => self.left_stick_down = value,
            ButtonCode::RightStickRight => self.right_stick_right = value,
            ButtonCode::RightStickLeft => self.right_stick_left = value,
            ButtonCode::RightStickUp => self.right_stick_up = value,
            ButtonCode::RightStickDown => self.right_stick_down = value,
            _ => {}
        }
    }

    fn left_stick(&self) -> Vec2 {
        vec2(
            self.left_stick_right - self.left_stick_left,
            self.left_stick_up - self.left_stick_down,
        )
    }

    fn right_stick(&self) -> Vec2 {
        vec2(
            self.right_stick_right - self.right_stick_left,
            self.right_stick_up - self.right_stick_down,
        )
    }
}

fn dead_zone(stick: Vec2) -> Vec2 {
    if stick.length() < STICK_DEAD_ZONE {
        Vec2::ZERO
    } else {
        stick.clamp_length_max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick(controls: &mut Controls, button: ButtonCode, value: f32) {
        controls.button(&ButtonEvent { button, value });
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut controls = Controls::new();
        controls.key(KeyCode::KeyW, true);
        controls.key(KeyCode::KeyS, true);
        controls.key(KeyCode::KeyD, true);

        let frame = controls.next_frame();

        assert_eq!(frame.movement, vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn held_keys_last_until_released() {
        let mut controls = Controls::new();
        controls.key(KeyCode::KeyQ, true);

        assert_eq!(controls.next_frame().movement.y, -1.0);
        assert_eq!(controls.next_frame().movement.y, -1.0);

        controls.key(KeyCode::KeyQ, false);
        assert_eq!(controls.next_frame().movement.y, 0.0);
    }

    #[test]
    fn recenter_fires_once_per_press() {
        let mut controls = Controls::new();
        controls.key(KeyCode::KeyR, true);
        // Key repeat while held.
        controls.key(KeyCode::KeyR, true);

        assert!(controls.next_frame().recenter);
        assert!(!controls.next_frame().recenter);

        controls.key(KeyCode::KeyR, false);
        controls.key(KeyCode::KeyR, true);
        assert!(controls.next_frame().recenter);
    }

    #[test]
    fn escape_and_start_exit() {
        let mut controls = Controls::new();
        controls.key(KeyCode::Escape, true);
        assert!(controls.next_frame().exit);

        stick(&mut controls, ButtonCode::Start, 1.0);
        assert!(controls.next_frame().exit);
        assert!(!controls.next_frame().exit);
    }

    #[test]
    fn small_stick_deflection_is_ignored() {
        let mut controls = Controls::new();
        stick(&mut controls, ButtonCode::LeftStickRight, 0.1);

        assert_eq!(controls.next_frame().movement, Vec3::ZERO);

        stick(&mut controls, ButtonCode::LeftStickRight, 0.8);
        assert!((controls.next_frame().movement.x - 0.8).abs() < 1e-6);
    }

    #[test]
    fn right_stick_right_turns_right() {
        let mut controls = Controls::new();
        stick(&mut controls, ButtonCode::RightStickRight, 1.0);

        let frame = controls.next_frame();
        let mut camera = Camera::default();
        let before = camera.forward();
        frame.apply(&mut camera, 0.1);

        assert!(frame.look.x < 0.0);
        assert!(before.cross(camera.forward()).y < 0.0);
    }

    #[test]
    fn mouse_only_looks_while_right_button_is_held() {
        let mut controls = Controls::new();

        controls.event(DeviceEvent::MouseMotion { dx: 10.0, dy: 0.0 });
        assert_eq!(controls.next_frame().mouse, Vec2::ZERO);

        controls.event(DeviceEvent::MouseButton {
            button: MouseButton::Right,
            is_held: true,
        });
        controls.event(DeviceEvent::MouseMotion { dx: 10.0, dy: -4.0 });
        controls.event(DeviceEvent::MouseMotion { dx: 2.0, dy: 0.0 });

        assert_eq!(controls.next_frame().mouse, vec2(12.0, -4.0));
        assert_eq!(controls.next_frame().mouse, Vec2::ZERO);
    }

    #[test]
    fn look_speed_is_degrees_per_second() {
        let mut camera = Camera::default();
        let before = camera.forward();
        let frame = ControlsFrame {
            look: vec2(1.0, 0.0),
            ..Default::default()
        };

        frame.apply(&mut camera, 1.0);

        let turned = before.with_y(0.0).angle_between(camera.forward().with_y(0.0));
        assert!((turned.to_degrees() - camera.look_speed).abs() < 1e-2);
    }

    #[test]
    fn movement_follows_speed_and_time() {
        let mut camera = Camera::default();
        let start = camera.eye;
        let frame = ControlsFrame {
            movement: vec3(0.0, 0.0, 1.0),
            ..Default::default()
        };

        frame.apply(&mut camera, 0.5);

        let moved = (camera.eye - start).length();
        assert!((moved - camera.movement_speed * 0.5).abs() < 1e-4);
    }
}
