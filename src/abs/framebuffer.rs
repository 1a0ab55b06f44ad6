//! Offscreen render targets.
//!
//! The demo renders its scene into one [`Framebuffer`] with several color
//! attachments written simultaneously (MRT) plus a depth attachment, then
//! binds a finished attachment as a texture for the composite pass. Reading
//! an attachment while the framebuffer is still active is undefined; the
//! render pipeline's pass ordering is what prevents it, not this module.

use std::sync::Arc;

use glow::HasContext;

/// Color attachment storage format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Rgba8,
}

/// Depth attachment storage format, or no depth attachment at all. Also used
/// as the fallback depth mode when deactivating: `Disable` turns the depth
/// test off for the passes that follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthFormat {
    Disable,
    Depth24,
}

/// An offscreen framebuffer with `color_targets` color attachments and an
/// optional depth attachment, sized exactly to its creation dimensions.
pub struct Framebuffer {
    gl: Arc<glow::Context>,
    fbo: glow::Framebuffer,
    color_textures: Vec<glow::Texture>,
    depth_texture: Option<glow::Texture>,
    width: i32,
    height: i32,
}

impl Framebuffer {
    pub fn new(
        gl: &Arc<glow::Context>,
        color_targets: usize,
        color_format: ColorFormat,
        depth_format: DepthFormat,
        width: i32,
        height: i32,
    ) -> Result<Self, String> {
        unsafe {
            let fbo = gl.create_framebuffer().map_err(|e| e.to_string())?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

            let (internal, format, ty) = match color_format {
                ColorFormat::Rgba8 => (glow::RGBA8 as i32, glow::RGBA, glow::UNSIGNED_BYTE),
            };

            let mut color_textures = Vec::with_capacity(color_targets);
            let mut draw_buffers = Vec::with_capacity(color_targets);
            for index in 0..color_targets {
                let tex = gl.create_texture().map_err(|e| e.to_string())?;
                gl.bind_texture(glow::TEXTURE_2D, Some(tex));
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    internal,
                    width,
                    height,
                    0,
                    format,
                    ty,
                    glow::PixelUnpackData::Slice(None),
                );
                Self::attachment_params(gl, glow::LINEAR);
                let attachment = glow::COLOR_ATTACHMENT0 + index as u32;
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment,
                    glow::TEXTURE_2D,
                    Some(tex),
                    0,
                );
                color_textures.push(tex);
                draw_buffers.push(attachment);
            }
            gl.draw_buffers(&draw_buffers);

            let depth_texture = match depth_format {
                DepthFormat::Disable => None,
                DepthFormat::Depth24 => {
                    let tex = gl.create_texture().map_err(|e| e.to_string())?;
                    gl.bind_texture(glow::TEXTURE_2D, Some(tex));
                    gl.tex_image_2d(
                        glow::TEXTURE_2D,
                        0,
                        glow::DEPTH_COMPONENT24 as i32,
                        width,
                        height,
                        0,
                        glow::DEPTH_COMPONENT,
                        glow::UNSIGNED_INT,
                        glow::PixelUnpackData::Slice(None),
                    );
                    Self::attachment_params(gl, glow::NEAREST);
                    gl.framebuffer_texture_2d(
                        glow::FRAMEBUFFER,
                        glow::DEPTH_ATTACHMENT,
                        glow::TEXTURE_2D,
                        Some(tex),
                        0,
                    );
                    Some(tex)
                }
            };

            gl.bind_texture(glow::TEXTURE_2D, None);

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                let result = Self {
                    gl: Arc::clone(gl),
                    fbo,
                    color_textures,
                    depth_texture,
                    width,
                    height,
                };
                drop(result);
                return Err(format!("framebuffer incomplete, status {status:#06x}"));
            }

            Ok(Self {
                gl: Arc::clone(gl),
                fbo,
                color_textures,
                depth_texture,
                width,
                height,
            })
        }
    }

    fn attachment_params(gl: &glow::Context, filter: u32) {
        unsafe {
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }
    }

    pub fn color_target_count(&self) -> usize {
        self.color_textures.len()
    }

    /// Redirects all subsequent draw calls to this target and matches the
    /// viewport to the attachment size.
    pub fn activate(&self) {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            self.gl.viewport(0, 0, self.width, self.height);
        }
    }

    /// Restores the default surface with the given viewport and fallback
    /// depth mode.
    pub fn deactivate_set_viewport(
        gl: &glow::Context,
        fallback_depth: DepthFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.viewport(x, y, width, height);
            match fallback_depth {
                DepthFormat::Disable => gl.disable(glow::DEPTH_TEST),
                DepthFormat::Depth24 => gl.enable(glow::DEPTH_TEST),
            }
        }
    }

    /// Exposes a completed color attachment as a readable texture.
    pub fn bind_color_texture(&self, unit: u32, index: usize) {
        if let Some(tex) = self.color_textures.get(index) {
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(*tex));
            }
        }
    }

    /// Exposes the depth attachment as a readable texture, if one exists.
    pub fn bind_depth_texture(&self, unit: u32) {
        if let Some(tex) = self.depth_texture {
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(tex));
            }
        }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            for tex in self.color_textures.drain(..) {
                self.gl.delete_texture(tex);
            }
            if let Some(tex) = self.depth_texture.take() {
                self.gl.delete_texture(tex);
            }
            self.gl.delete_framebuffer(self.fbo);
        }
    }
}
