//! Asset loading: shader program set, textures, geometry, framebuffer.
//!
//! Everything here is loaded once at startup and read-only afterwards. Load
//! failures follow one rule: report through the logger, leave the slot absent
//! or substitute a generated fallback, keep running with degraded visuals.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec4};
use log::{info, warn};

use crate::abs::{
    BufferPool, ColorFormat, DepthFormat, Drawable, Framebuffer, ShaderProgram, Texture,
    TextureSettings, pool_layout,
};
use crate::geometry::{self, GeometryData, ShapeDescriptor, cache};
use crate::state::DEMO_MODE_COUNT;

/// Builds one shader program from the `vert.glsl`/`frag.glsl` pair under
/// `src/render/shaders/<name>/`.
#[macro_export]
macro_rules! shader_program {
    ($name:ident, $gl:expr, $path_prefix:literal) => {{
        let link = || -> Result<$crate::abs::ShaderProgram, String> {
            let vert = $crate::abs::Shader::new(
                &$gl,
                glow::VERTEX_SHADER,
                include_str!(concat!(
                    $path_prefix,
                    "/render/shaders/",
                    stringify!($name),
                    "/vert.glsl"
                )),
            )?;
            let frag = $crate::abs::Shader::new(
                &$gl,
                glow::FRAGMENT_SHADER,
                include_str!(concat!(
                    $path_prefix,
                    "/render/shaders/",
                    stringify!($name),
                    "/frag.glsl"
                )),
            )?;
            $crate::abs::ShaderProgram::new(&$gl, &[&vert, &frag])
        };
        link()
    }};
}

/// The closed set of shader programs the demo links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramId {
    /// Plain texturing (skybox, composite quad).
    Texture,
    /// Uniform flat color (grid).
    FlatColor,
    /// Per-vertex color (axes overlay).
    VertexColor,
    /// Combined texture/diffuse/Lambert/Phong MRT shading.
    CombinedMrt,
    /// Color-effect MRT shading (hsv, hsl, grayscale, heatmap).
    EffectsMrt,
}

/// A linked program plus its resolved uniform locations. The uniform name
/// list is closed; a name a given program does not use resolves to `None`
/// and sends to it are silent no-ops.
pub struct SceneProgram {
    program: ShaderProgram,
    u_mvp: Option<glow::UniformLocation>,
    u_light_pos_obj: Option<glow::UniformLocation>,
    u_eye_pos_obj: Option<glow::UniformLocation>,
    u_tex_dm: Option<glow::UniformLocation>,
    u_tex_sm: Option<glow::UniformLocation>,
    u_color: Option<glow::UniformLocation>,
}

impl SceneProgram {
    pub fn new(program: ShaderProgram) -> Self {
        let u_mvp = program.uniform_location("uMVP");
        let u_light_pos_obj = program.uniform_location("uLightPos_obj");
        let u_eye_pos_obj = program.uniform_location("uEyePos_obj");
        let u_tex_dm = program.uniform_location("uTex_dm");
        let u_tex_sm = program.uniform_location("uTex_sm");
        let u_color = program.uniform_location("uColor");
        let resolved = Self {
            program,
            u_mvp,
            u_light_pos_obj,
            u_eye_pos_obj,
            u_tex_dm,
            u_tex_sm,
            u_color,
        };

        // defaults that never change or are consistent across all programs
        resolved.activate();
        resolved.send_mvp(&Mat4::IDENTITY);
        resolved.send_light_pos(Vec4::W);
        resolved.send_eye_pos(Vec4::W);
        resolved.program.send(resolved.u_tex_dm.as_ref(), 0);
        resolved.program.send(resolved.u_tex_sm.as_ref(), 1);
        resolved.send_color(Vec4::ONE);
        resolved
    }

    pub fn activate(&self) {
        self.program.use_program();
    }

    pub fn send_mvp(&self, mvp: &Mat4) {
        self.program.send(self.u_mvp.as_ref(), mvp);
    }

    pub fn send_light_pos(&self, light_pos_obj: Vec4) {
        self.program.send(self.u_light_pos_obj.as_ref(), light_pos_obj);
    }

    pub fn send_eye_pos(&self, eye_pos_obj: Vec4) {
        self.program.send(self.u_eye_pos_obj.as_ref(), eye_pos_obj);
    }

    pub fn send_color(&self, color: Vec4) {
        self.program.send(self.u_color.as_ref(), color);
    }
}

/// The program set, keyed by [`ProgramId`]. A program whose shaders failed to
/// compile or link is simply absent; the passes that need it are skipped.
pub struct ProgramSet {
    programs: HashMap<ProgramId, SceneProgram>,
}

impl ProgramSet {
    pub fn load(gl: &Arc<glow::Context>) -> Self {
        let mut programs = HashMap::new();
        let results: [(ProgramId, Result<ShaderProgram, String>); 5] = [
            (ProgramId::Texture, shader_program!(texture, gl, ".")),
            (ProgramId::FlatColor, shader_program!(flat_color, gl, ".")),
            (ProgramId::VertexColor, shader_program!(vertex_color, gl, ".")),
            (ProgramId::CombinedMrt, shader_program!(combined_mrt, gl, ".")),
            (ProgramId::EffectsMrt, shader_program!(effects_mrt, gl, ".")),
        ];
        for (id, result) in results {
            match result {
                Ok(program) => {
                    programs.insert(id, SceneProgram::new(program));
                }
                Err(log) => warn!("shader program {id:?} failed to build: {log}"),
            }
        }
        Self { programs }
    }

    pub fn get(&self, id: ProgramId) -> Option<&SceneProgram> {
        self.programs.get(&id)
    }
}

/// Generated stand-in pixels for a texture that failed to load.
fn fallback_checker(size: u32, light: [u8; 4], dark: [u8; 4]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let cell = ((x / 8) + (y / 8)) % 2 == 0;
            pixels.extend_from_slice(if cell { &light } else { &dark });
        }
    }
    pixels
}

fn fallback_gradient(size: u32, top: [u8; 4], bottom: [u8; 4]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        let t = y as f32 / (size - 1) as f32;
        let mut pixel = [0u8; 4];
        for c in 0..4 {
            pixel[c] = (top[c] as f32 * (1.0 - t) + bottom[c] as f32 * t) as u8;
        }
        for _ in 0..size {
            pixels.extend_from_slice(&pixel);
        }
    }
    pixels
}

fn load_texture(
    gl: &Arc<glow::Context>,
    path: &str,
    settings: TextureSettings,
    fallback: Vec<u8>,
    fallback_size: u32,
) -> Result<Texture, String> {
    match image::open(path) {
        Ok(decoded) => Texture::from_image(gl, &decoded, settings),
        Err(e) => {
            warn!("texture {path} failed to load ({e}), using generated fallback");
            Texture::from_rgba(gl, fallback_size, fallback_size, &fallback, settings)
        }
    }
}

/// All textures the scene binds, loaded from disk with generated fallbacks.
pub struct DemoTextures {
    pub checker: Texture,
    pub sky: Texture,
    pub stone: Texture,
    pub earth_dm: Texture,
    pub earth_sm: Texture,
}

impl DemoTextures {
    pub fn load(gl: &Arc<glow::Context>) -> Result<Self, String> {
        const SIZE: u32 = 64;
        Ok(Self {
            checker: load_texture(
                gl,
                "assets/tex/checker.png",
                TextureSettings::default_settings(),
                fallback_checker(SIZE, [235, 235, 235, 255], [30, 30, 30, 255]),
                SIZE,
            )?,
            sky: load_texture(
                gl,
                "assets/tex/sky_clouds.png",
                TextureSettings::linear_repeat(),
                fallback_gradient(SIZE, [110, 170, 235, 255], [225, 235, 250, 255]),
                SIZE,
            )?,
            stone: load_texture(
                gl,
                "assets/tex/stone_dm.png",
                TextureSettings::linear_repeat(),
                fallback_checker(SIZE, [140, 135, 130, 255], [110, 105, 100, 255]),
                SIZE,
            )?,
            earth_dm: load_texture(
                gl,
                "assets/tex/earth_dm.png",
                TextureSettings::linear_clamp_v(),
                fallback_gradient(SIZE, [40, 90, 180, 255], [30, 130, 70, 255]),
                SIZE,
            )?,
            earth_sm: load_texture(
                gl,
                "assets/tex/earth_sm.png",
                TextureSettings::linear_clamp_v(),
                fallback_gradient(SIZE, [220, 220, 220, 255], [40, 40, 40, 255]),
                SIZE,
            )?,
        })
    }
}

/// Fixed order of shapes in the geometry cache and the shared buffer pool:
/// static scene shapes, then procedural shapes, then loaded models.
const SHAPE_DESCRIPTORS: [ShapeDescriptor; 8] = [
    ShapeDescriptor::Axes,
    ShapeDescriptor::WirePlane {
        width: 20.0,
        height: 20.0,
        divisions_x: 20,
        divisions_y: 20,
    },
    ShapeDescriptor::TexturedQuad {
        width: 2.0,
        height: 2.0,
    },
    ShapeDescriptor::TexturedBox { size: 100.0 },
    ShapeDescriptor::SolidPlane {
        width: 40.0,
        height: 40.0,
        divisions_x: 40,
        divisions_y: 40,
    },
    ShapeDescriptor::Sphere {
        radius: 2.0,
        slices: 32,
        stacks: 24,
    },
    ShapeDescriptor::Cylinder {
        radius: 1.0,
        length: 4.0,
        slices: 32,
    },
    ShapeDescriptor::Torus {
        major_radius: 2.0,
        minor_radius: 0.5,
        slices: 32,
        rings: 24,
    },
];

const SHAPE_COUNT: usize = SHAPE_DESCRIPTORS.len() + 1; // plus the teapot
const TEAPOT_OBJ_PATH: &str = "assets/obj/teapot.obj";
const TEAPOT_SCALE: f32 = 0.05;
const GEOMETRY_CACHE_PATH: &str = "data/geom_cache.dat";

fn generate_all_shapes() -> Vec<GeometryData> {
    let mut shapes: Vec<GeometryData> = SHAPE_DESCRIPTORS.iter().map(geometry::generate).collect();
    match geometry::load_obj_model(Path::new(TEAPOT_OBJ_PATH), TEAPOT_SCALE) {
        Ok(teapot) => shapes.push(teapot),
        Err(e) => {
            warn!("model {TEAPOT_OBJ_PATH} failed to load ({e}), substituting a sphere");
            shapes.push(geometry::generate(&ShapeDescriptor::Sphere {
                radius: 1.5,
                slices: 24,
                stacks: 18,
            }));
        }
    }
    shapes
}

/// Reads the geometry cache, or generates every shape and rewrites it.
fn load_shapes(streaming: bool) -> Vec<GeometryData> {
    if streaming {
        match File::open(GEOMETRY_CACHE_PATH) {
            Ok(file) => match cache::read_cache(&mut BufReader::new(file), SHAPE_COUNT) {
                Ok(shapes) => {
                    info!("geometry cache hit: {GEOMETRY_CACHE_PATH}");
                    return shapes;
                }
                Err(e) => warn!("geometry cache unusable ({e}), regenerating"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("geometry cache unreadable ({e}), regenerating"),
        }
    }

    let shapes = generate_all_shapes();
    if streaming {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = Path::new(GEOMETRY_CACHE_PATH).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(GEOMETRY_CACHE_PATH)?;
            cache::write_cache(&mut BufWriter::new(file), &shapes)
        };
        match write() {
            Ok(()) => info!("geometry cache written: {GEOMETRY_CACHE_PATH}"),
            Err(e) => warn!("geometry cache write failed ({e})"),
        }
    }
    shapes
}

/// Every drawable in the demo, carved out of one shared buffer pool.
pub struct DrawableSet {
    pub axes: Drawable,
    pub grid: Drawable,
    pub fsq: Drawable,
    pub skybox: Drawable,
    pub ground: Drawable,
    pub sphere: Drawable,
    pub cylinder: Drawable,
    pub torus: Drawable,
    pub teapot: Drawable,
}

impl DrawableSet {
    pub fn load(gl: &Arc<glow::Context>, streaming: bool) -> Result<Self, String> {
        let shapes = load_shapes(streaming);

        let entries: Vec<(usize, usize)> = shapes
            .iter()
            .map(|shape| (shape.vertex_buffer_size(), shape.indices.len()))
            .collect();
        let (_, vertex_total, index_total) = pool_layout(&entries);
        let mut pool = BufferPool::new(gl, vertex_total, index_total)?;

        let mut drawables = Vec::with_capacity(shapes.len());
        for shape in &shapes {
            drawables.push(pool.push(
                shape.format,
                shape.mode,
                &shape.interleave(),
                &shape.indices,
            )?);
        }

        let mut drawables = drawables.into_iter();
        let mut next = || drawables.next().expect("drawable count matches shape count");
        Ok(Self {
            axes: next(),
            grid: next(),
            fsq: next(),
            skybox: next(),
            ground: next(),
            sphere: next(),
            cylinder: next(),
            torus: next(),
            teapot: next(),
        })
    }
}

/// Everything the render pipeline reads, loaded once at startup.
pub struct DemoResources {
    pub programs: ProgramSet,
    pub textures: DemoTextures,
    pub drawables: DrawableSet,
    pub fbo_scene: Framebuffer,
}

impl DemoResources {
    pub fn load(
        gl: &Arc<glow::Context>,
        frame_width: i32,
        frame_height: i32,
        streaming: bool,
    ) -> Result<Self, String> {
        let fbo_scene = Framebuffer::new(
            gl,
            DEMO_MODE_COUNT,
            ColorFormat::Rgba8,
            DepthFormat::Depth24,
            frame_width,
            frame_height,
        )?;
        Ok(Self {
            programs: ProgramSet::load(gl),
            textures: DemoTextures::load(gl)?,
            drawables: DrawableSet::load(gl, streaming)?,
            fbo_scene,
        })
    }
}
