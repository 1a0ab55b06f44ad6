//! Frame rendering: scene passes into the offscreen framebuffer, then a
//! full-screen composite of the selected target onto the window.

use glam::{Mat4, Vec4, vec4};
use glow::HasContext;

use crate::abs::{DepthFormat, Drawable, Framebuffer, Texture};
use crate::resources::{DemoResources, ProgramId, SceneProgram};
use crate::state::{DemoState, ShapeId};
use crate::transform::{self, AuthoredAxis, VerticalAxis};

const SKY_BLUE: Vec4 = vec4(0.52, 0.80, 0.92, 1.0);
const GRID_COLOR_Y_UP: Vec4 = vec4(0.25, 0.65, 0.30, 1.0);
const GRID_COLOR_Z_UP: Vec4 = vec4(0.25, 0.40, 0.70, 1.0);

/// Diffuse and specular textures for one scene shape.
fn shape_textures(shape: ShapeId, textures: &crate::resources::DemoTextures) -> (&Texture, &Texture) {
    match shape {
        ShapeId::Ground => (&textures.stone, &textures.stone),
        ShapeId::Sphere => (&textures.earth_dm, &textures.earth_sm),
        ShapeId::Cylinder => (&textures.checker, &textures.checker),
        ShapeId::Torus => (&textures.earth_dm, &textures.earth_sm),
        ShapeId::Teapot => (&textures.checker, &textures.checker),
    }
}

fn shape_drawable(shape: ShapeId, drawables: &crate::resources::DrawableSet) -> &Drawable {
    match shape {
        ShapeId::Ground => &drawables.ground,
        ShapeId::Sphere => &drawables.sphere,
        ShapeId::Cylinder => &drawables.cylinder,
        ShapeId::Torus => &drawables.torus,
        ShapeId::Teapot => &drawables.teapot,
    }
}

/// Draws the sky box around the viewer. The view rotation keeps the box
/// centered on the camera; depth always passes so everything later draws
/// over it, and front-face culling shows the inside of the box.
fn render_skybox(
    gl: &glow::Context,
    program: &SceneProgram,
    state: &DemoState,
    res: &DemoResources,
) {
    let mut view_rot = state.camera_object.model_mat_inv;
    view_rot.w_axis = Vec4::W;
    let remap = transform::resolve_remap(AuthoredAxis::YUp, state.vertical_axis);
    let mvp = state.camera.projection_mat * view_rot * remap;

    program.activate();
    program.send_mvp(&mvp);
    program.send_color(SKY_BLUE);
    res.textures.sky.bind(0);

    unsafe {
        gl.cull_face(glow::FRONT);
        gl.depth_func(glow::ALWAYS);
    }
    res.drawables.skybox.draw();
    unsafe {
        gl.cull_face(glow::BACK);
        gl.depth_func(glow::LEQUAL);
    }
}

fn render_grid(program: &SceneProgram, state: &DemoState, res: &DemoResources) {
    let remap = transform::resolve_remap(AuthoredAxis::ZUp, state.vertical_axis);
    let mvp = state.camera.view_projection_mat * remap;
    let color = match state.vertical_axis {
        VerticalAxis::Y => GRID_COLOR_Y_UP,
        VerticalAxis::Z => GRID_COLOR_Z_UP,
    };

    program.activate();
    program.send_mvp(&mvp);
    program.send_color(color);
    res.drawables.grid.draw();
}

/// Draws the five scene shapes with the active MRT program. Light and eye
/// positions are pushed into each shape's object space so the fragment
/// stage never needs the model matrix.
fn render_scene_shapes(program: &SceneProgram, state: &DemoState, res: &DemoResources) {
    program.activate();
    let eye_pos_world = state.camera_object.position.extend(1.0);

    for shape in ShapeId::DRAW_ORDER {
        let object = state.scene_object(shape);
        let remap = transform::resolve_remap(shape.authored_axis(), state.vertical_axis);
        let model = object.model_mat * remap;
        let model_inv = transform::inverse_ignore_scale(&model);

        program.send_mvp(&(state.camera.view_projection_mat * model));
        program.send_light_pos(model_inv * state.light_pos_world);
        program.send_eye_pos(model_inv * eye_pos_world);

        let (dm, sm) = shape_textures(shape, &res.textures);
        dm.bind(0);
        sm.bind(1);
        shape_drawable(shape, &res.drawables).draw();
    }
}

/// Composites the selected offscreen target onto the window through the
/// full-screen quad. Depth stays disabled so the quad always lands.
fn render_composite(
    gl: &glow::Context,
    program: &SceneProgram,
    state: &DemoState,
    res: &DemoResources,
    window_width: i32,
    window_height: i32,
) {
    Framebuffer::deactivate_set_viewport(
        gl,
        DepthFormat::Disable,
        0,
        0,
        window_width,
        window_height,
    );
    unsafe {
        gl.clear(glow::COLOR_BUFFER_BIT);
    }

    if state.display_depth {
        res.fbo_scene.bind_depth_texture(0);
    } else {
        res.fbo_scene.bind_color_texture(0, state.demo_mode);
    }

    program.activate();
    program.send_mvp(&Mat4::IDENTITY);
    res.drawables.fsq.draw();
}

fn render_axes(program: &SceneProgram, state: &DemoState, res: &DemoResources) {
    program.activate();
    program.send_mvp(&state.camera.view_projection_mat);
    res.drawables.axes.draw();
}

/// Renders one frame. The scene passes draw into the offscreen framebuffer;
/// the composite pass presents one of its targets; overlays draw last,
/// directly over the composited image.
pub fn render(
    gl: &glow::Context,
    state: &DemoState,
    res: &DemoResources,
    window_width: i32,
    window_height: i32,
) {
    res.fbo_scene.activate();
    unsafe {
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }

    if let Some(program) = res.programs.get(ProgramId::Texture) {
        render_skybox(gl, program, state, res);
    }

    if state.display_grid {
        if let Some(program) = res.programs.get(ProgramId::FlatColor) {
            render_grid(program, state, res);
        }
    }

    let scene_program = if state.use_effects_program {
        ProgramId::EffectsMrt
    } else {
        ProgramId::CombinedMrt
    };
    if let Some(program) = res.programs.get(scene_program) {
        render_scene_shapes(program, state, res);
    }

    if let Some(program) = res.programs.get(ProgramId::Texture) {
        render_composite(gl, program, state, res, window_width, window_height);
    }

    if state.display_axes {
        if let Some(program) = res.programs.get(ProgramId::VertexColor) {
            render_axes(program, state, res);
        }
    }

    // leave the pipeline in a known state for the next frame
    unsafe {
        gl.enable(glow::DEPTH_TEST);
        Texture::unbind(gl, 1);
        Texture::unbind(gl, 0);
        gl.use_program(None);
    }
}
