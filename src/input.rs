//! Polled input device state.
//!
//! Filled in by the event loop and read (never written) by the update phase.

use std::collections::HashSet;

use glam::Vec2;
use sdl2::{controller::GameController, keyboard::Keycode, mouse::MouseButton};

/// The current state of the keyboard.
#[derive(Default)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
    pub pressed: HashSet<Keycode>,
    pub released: HashSet<Keycode>,
}

impl KeyboardState {
    pub fn is_down(&self, key: Keycode) -> bool {
        self.down.contains(&key)
    }

    /// Newly pressed this frame.
    pub fn is_pressed(&self, key: Keycode) -> bool {
        self.pressed.contains(&key)
    }

    /// +1 if `positive` is held, -1 if `negative` is held, 0 otherwise.
    pub fn axis(&self, positive: Keycode, negative: Keycode) -> f32 {
        (self.is_down(positive) as i32 - self.is_down(negative) as i32) as f32
    }
}

/// The current state of the mouse.
#[derive(Default)]
pub struct MouseState {
    pub position: Vec2,
    pub delta: Vec2,
    pub down: HashSet<MouseButton>,
    pub pressed: HashSet<MouseButton>,
    pub released: HashSet<MouseButton>,
}

impl MouseState {
    pub fn is_held(&self, button: MouseButton) -> bool {
        self.down.contains(&button)
    }
}

/// Polled state of an attached game controller, if any.
#[derive(Default)]
pub struct GamepadState {
    pub connected: bool,
    pub left_stick: Vec2,
    pub right_stick: Vec2,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl GamepadState {
    const DEAD_ZONE: f32 = 0.15;

    /// Reads the controller axes, normalized to [-1, 1] with a dead zone.
    pub fn poll(&mut self, controller: Option<&GameController>) {
        let Some(controller) = controller else {
            *self = Self::default();
            return;
        };
        let axis = |axis| {
            let value = controller.axis(axis) as f32 / i16::MAX as f32;
            if value.abs() < Self::DEAD_ZONE { 0.0 } else { value }
        };
        self.connected = true;
        self.left_stick = Vec2::new(
            axis(sdl2::controller::Axis::LeftX),
            axis(sdl2::controller::Axis::LeftY),
        );
        self.right_stick = Vec2::new(
            axis(sdl2::controller::Axis::RightX),
            axis(sdl2::controller::Axis::RightY),
        );
        self.left_trigger = axis(sdl2::controller::Axis::TriggerLeft).max(0.0);
        self.right_trigger = axis(sdl2::controller::Axis::TriggerRight).max(0.0);
    }
}

/// Everything the update phase reads in one place.
#[derive(Default)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
    pub gamepad: GamepadState,
}

impl InputState {
    /// Clears the per-frame edge state; held state persists.
    pub fn begin_frame(&mut self) {
        self.keyboard.pressed.clear();
        self.keyboard.released.clear();
        self.mouse.pressed.clear();
        self.mouse.released.clear();
        self.mouse.delta = Vec2::ZERO;
    }
}
