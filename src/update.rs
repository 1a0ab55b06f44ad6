//! Per-frame input handling and simulation update.
//!
//! Runs strictly between event polling and rendering: `handle_input` mutates
//! the camera and mode toggles from the polled device state, `update` moves
//! the shapes and re-derives every matrix the renderer will read.

use glam::{Vec3, vec3};
use log::info;
use sdl2::{keyboard::Keycode, mouse::MouseButton};

use crate::input::InputState;
use crate::state::DemoState;
use crate::transform::{VerticalAxis, rotation_from_euler};

/// Degrees per second the demo shapes spin at.
const SHAPE_SPIN_SPEED: f32 = 15.0;

fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Moves the camera object along its own local axes.
fn move_camera(state: &mut DemoState, amount: Vec3, dt: f32) {
    if amount == Vec3::ZERO {
        return;
    }
    let step = amount * state.camera.ctrl_move_speed * dt;
    let rotation = rotation_from_euler(state.camera_object.euler);
    state.camera_object.position += rotation.transform_vector3(step);
}

/// Applies pitch plus either yaw or roll, depending on which axis is
/// vertical: mouse X controls yaw when Y is up, roll when Z is up. That
/// choice is what makes the chosen axis feel like "up".
fn rotate_camera(state: &mut DemoState, pitch: f32, azimuth: f32, speed: f32, dt: f32) {
    if pitch == 0.0 && azimuth == 0.0 {
        return;
    }
    let step = speed * state.camera.ctrl_rotate_speed * dt;
    let euler = &mut state.camera_object.euler;
    euler.x = wrap_degrees(euler.x + step * pitch);
    match state.vertical_axis {
        VerticalAxis::Y => euler.y = wrap_degrees(euler.y + step * azimuth),
        VerticalAxis::Z => euler.z = wrap_degrees(euler.z + step * azimuth),
    }
}

/// Reads the polled input and applies camera control and mode switches.
pub fn handle_input(state: &mut DemoState, input: &InputState, dt: f32) {
    if input.gamepad.connected {
        // right stick and triggers move, left stick rotates
        let movement = vec3(
            input.gamepad.right_stick.x,
            input.gamepad.right_trigger - input.gamepad.left_trigger,
            input.gamepad.right_stick.y,
        );
        move_camera(state, movement, dt);
        rotate_camera(
            state,
            input.gamepad.left_stick.y,
            -input.gamepad.left_stick.x,
            10.0,
            dt,
        );
    } else {
        let keyboard = &input.keyboard;
        let movement = vec3(
            keyboard.axis(Keycode::D, Keycode::A),
            keyboard.axis(Keycode::E, Keycode::Q),
            keyboard.axis(Keycode::S, Keycode::W),
        );
        move_camera(state, movement, dt);

        if input.mouse.is_held(MouseButton::Left) {
            rotate_camera(state, -input.mouse.delta.y, -input.mouse.delta.x, 1.0, dt);
        }
    }

    let keyboard = &input.keyboard;
    if keyboard.is_pressed(Keycode::L) {
        state.use_effects_program = !state.use_effects_program;
        info!(
            "shading program: {}",
            if state.use_effects_program {
                "effects"
            } else {
                "combined"
            }
        );
    }
    if keyboard.is_pressed(Keycode::Period) {
        state.next_demo_mode();
        info!(
            "demo mode {} / {}",
            state.demo_mode + 1,
            state.demo_mode_count
        );
    }
    if keyboard.is_pressed(Keycode::Comma) {
        state.prev_demo_mode();
        info!(
            "demo mode {} / {}",
            state.demo_mode + 1,
            state.demo_mode_count
        );
    }
    if keyboard.is_pressed(Keycode::F) {
        state.display_depth = !state.display_depth;
        info!(
            "compositing {}",
            if state.display_depth {
                "depth buffer".to_string()
            } else {
                format!("color target {}", state.demo_mode)
            }
        );
    }
    if keyboard.is_pressed(Keycode::G) {
        state.display_grid = !state.display_grid;
    }
    if keyboard.is_pressed(Keycode::X) {
        state.display_axes = !state.display_axes;
    }
}

/// Spins and places the shapes, then re-derives every matrix.
pub fn update(state: &mut DemoState, dt: f32) {
    let spin = dt * SHAPE_SPIN_SPEED;

    match state.vertical_axis {
        VerticalAxis::Y => {
            for object in [
                &mut state.sphere,
                &mut state.cylinder,
                &mut state.torus,
                &mut state.teapot,
            ] {
                object.euler.y = wrap_degrees(object.euler.y + spin);
            }
            state.sphere.position.x = 5.0;
            state.cylinder.position.z = -5.0;
            state.torus.position.x = -5.0;
            state.teapot.position.z = 5.0;

            state.ground.position.y = -4.0;
            state.ground.euler.x = -90.0;
        }
        VerticalAxis::Z => {
            for object in [
                &mut state.sphere,
                &mut state.cylinder,
                &mut state.torus,
                &mut state.teapot,
            ] {
                object.euler.z = wrap_degrees(object.euler.z + spin);
            }
            state.sphere.position.x = 5.0;
            state.cylinder.position.y = 5.0;
            state.torus.position.x = -5.0;
            state.teapot.position.y = -5.0;

            state.ground.position.z = -4.0;
        }
    }

    for object in state.objects_mut() {
        object.update();
    }
    let camera_object = state.camera_object;
    state.camera.update_view_projection(&camera_object);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ShapeId;
    use crate::transform::resolve_remap;
    use glam::Mat4;

    #[test]
    fn shapes_spin_about_the_vertical_axis() {
        let mut state = DemoState::new(VerticalAxis::Y, 1.0);
        update(&mut state, 1.0);
        assert!((state.sphere.euler.y - SHAPE_SPIN_SPEED).abs() < 1e-5);
        assert_eq!(state.sphere.euler.z, 0.0);

        let mut state = DemoState::new(VerticalAxis::Z, 1.0);
        update(&mut state, 1.0);
        assert!((state.torus.euler.z - SHAPE_SPIN_SPEED).abs() < 1e-5);
        assert_eq!(state.torus.euler.y, 0.0);
    }

    #[test]
    fn spin_angle_stays_in_range() {
        let mut state = DemoState::new(VerticalAxis::Y, 1.0);
        for _ in 0..100 {
            update(&mut state, 1.0);
        }
        assert!(state.sphere.euler.y >= 0.0 && state.sphere.euler.y < 360.0);
    }

    #[test]
    fn ground_sits_below_origin_in_both_conventions() {
        let mut y_up = DemoState::new(VerticalAxis::Y, 1.0);
        update(&mut y_up, 0.0);
        assert_eq!(y_up.ground.position.y, -4.0);
        assert_eq!(y_up.ground.euler.x, -90.0);

        let mut z_up = DemoState::new(VerticalAxis::Z, 1.0);
        update(&mut z_up, 0.0);
        assert_eq!(z_up.ground.position.z, -4.0);
        assert_eq!(z_up.ground.euler, Vec3::ZERO);
    }

    #[test]
    fn mvp_sequence_is_frame_independent() {
        let compute_mvps = |state: &DemoState| -> Vec<Mat4> {
            ShapeId::DRAW_ORDER
                .iter()
                .map(|shape| {
                    let object = state.scene_object(*shape);
                    let remap = resolve_remap(shape.authored_axis(), state.vertical_axis);
                    state.camera.view_projection_mat * (object.model_mat * remap)
                })
                .collect()
        };

        let mut state = DemoState::new(VerticalAxis::Y, 1.0);
        update(&mut state, 0.25);
        let first = compute_mvps(&state);
        // recomputation from the same inputs must match: no hidden
        // frame-to-frame state in the transform pipeline
        let second = compute_mvps(&state);
        assert_eq!(first, second);

        let expected: Vec<Mat4> = ShapeId::DRAW_ORDER
            .iter()
            .map(|shape| {
                let object = state.scene_object(*shape);
                let model = crate::transform::model_matrix(object.position, object.euler)
                    * resolve_remap(shape.authored_axis(), state.vertical_axis);
                state.camera.projection_mat * state.camera_object.model_mat_inv * model
            })
            .collect();
        for (a, b) in first.iter().zip(&expected) {
            let diff = (*a - *b).to_cols_array();
            assert!(diff.iter().all(|v| v.abs() < 1e-4));
        }
    }

    #[test]
    fn toggles_and_mode_keys() {
        let mut state = DemoState::new(VerticalAxis::Y, 1.0);
        let mut input = InputState::default();
        input.keyboard.pressed.insert(Keycode::L);
        input.keyboard.pressed.insert(Keycode::Period);
        input.keyboard.pressed.insert(Keycode::G);
        handle_input(&mut state, &input, 0.016);
        assert!(state.use_effects_program);
        assert_eq!(state.demo_mode, 1);
        assert!(!state.display_grid);
    }
}
