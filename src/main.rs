use std::time::Instant;

use glam::Vec2;
use glow::HasContext;
use log::{info, warn};
use sdl2::controller::GameController;
use sdl2::event::{Event, WindowEvent};

use crate::abs::App;
use crate::input::InputState;
use crate::resources::DemoResources;
use crate::state::DemoState;
use crate::transform::VerticalAxis;

mod abs;
mod geometry;
mod input;
mod render;
mod resources;
mod state;
mod transform;
mod update;

/// Which world axis points up. Flipping this rebuilds the whole scene in the
/// other convention; the starting view is identical either way.
const VERTICAL_AXIS: VerticalAxis = VerticalAxis::Y;

/// Whether generated geometry is streamed through the on-disk cache.
const GEOMETRY_STREAMING: bool = true;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() {
    setup_logger().unwrap();

    let mut app = App::new("Primview", WINDOW_WIDTH, WINDOW_HEIGHT);

    unsafe {
        app.gl.enable(glow::DEPTH_TEST);
        app.gl.depth_func(glow::LEQUAL);
        app.gl.enable(glow::CULL_FACE);
        app.gl.cull_face(glow::BACK);
        app.gl.front_face(glow::CCW);
        app.gl.enable(glow::BLEND);
        app.gl
            .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        app.gl.line_width(2.0);
        app.gl.clear_color(0.0, 0.0, 0.0, 1.0);
    }

    let resources = match DemoResources::load(
        &app.gl,
        WINDOW_WIDTH as i32,
        WINDOW_HEIGHT as i32,
        GEOMETRY_STREAMING,
    ) {
        Ok(resources) => resources,
        Err(e) => {
            log::error!("resource loading failed: {e}");
            return;
        }
    };

    let mut state = DemoState::new(VERTICAL_AXIS, WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32);
    let mut input = InputState::default();
    let mut gamepad: Option<GameController> = None;
    let mut window_width = WINDOW_WIDTH as i32;
    let mut window_height = WINDOW_HEIGHT as i32;

    info!("vertical axis: {VERTICAL_AXIS:?}");
    info!(
        "controls: WASD+EQ move, left-drag rotate, L shading program, \
         ,/. demo mode, F depth view, G grid, X axes"
    );

    let mut last_frame_time = Instant::now();

    'running: loop {
        let now = Instant::now();
        let delta_time = now.duration_since(last_frame_time).as_secs_f32();
        last_frame_time = now;

        input.begin_frame();

        for event in app.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'running,
                Event::Window {
                    win_event: WindowEvent::Resized(width, height),
                    ..
                } => {
                    window_width = width;
                    window_height = height;
                    state.camera.aspect = width as f32 / height as f32;
                    state.camera.update_projection();
                }
                Event::MouseMotion {
                    x, y, xrel, yrel, ..
                } => {
                    input.mouse.position = Vec2::new(x as f32, y as f32);
                    input.mouse.delta += Vec2::new(xrel as f32, yrel as f32);
                }
                Event::MouseButtonDown { mouse_btn, .. } => {
                    input.mouse.down.insert(mouse_btn);
                    input.mouse.pressed.insert(mouse_btn);
                }
                Event::MouseButtonUp { mouse_btn, .. } => {
                    input.mouse.down.remove(&mouse_btn);
                    input.mouse.released.insert(mouse_btn);
                }
                Event::KeyDown {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => {
                    input.keyboard.down.insert(keycode);
                    input.keyboard.pressed.insert(keycode);
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    repeat: false,
                    ..
                } => {
                    input.keyboard.down.remove(&keycode);
                    input.keyboard.released.insert(keycode);
                }
                Event::ControllerDeviceAdded { which, .. } => {
                    match app.controller_subsystem.open(which) {
                        Ok(controller) => {
                            info!("controller connected: {}", controller.name());
                            gamepad = Some(controller);
                        }
                        Err(e) => warn!("controller {which} failed to open: {e}"),
                    }
                }
                Event::ControllerDeviceRemoved { .. } => {
                    info!("controller disconnected");
                    gamepad = None;
                }
                _ => {}
            }
        }

        input.gamepad.poll(gamepad.as_ref());

        update::handle_input(&mut state, &input, delta_time);
        update::update(&mut state, delta_time);
        render::render(&app.gl, &state, &resources, window_width, window_height);

        app.window.gl_swap_window();
    }
}
