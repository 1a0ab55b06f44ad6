//! Structs and functions for handling textures.
//!
//! The [`Texture`] struct owns a GPU texture created from a decoded image or
//! raw RGBA pixels. Filtering and repeat modes are chosen per texture, since
//! the demo mixes tiled surface textures with clamped ones.

use std::sync::Arc;

use glow::HasContext;
use image::{DynamicImage, GenericImageView};

/// Sampling settings applied at creation time.
#[derive(Clone, Copy)]
pub struct TextureSettings {
    /// `true` for linear pixel blending, `false` for nearest.
    pub linear: bool,
    /// Wrap mode on U: `true` repeats, `false` clamps to edge.
    pub repeat_u: bool,
    /// Wrap mode on V.
    pub repeat_v: bool,
}

impl TextureSettings {
    /// Nearest filtering, repeat on both axes.
    pub fn default_settings() -> Self {
        Self {
            linear: false,
            repeat_u: true,
            repeat_v: true,
        }
    }

    /// Linear filtering, repeat on both axes.
    pub fn linear_repeat() -> Self {
        Self {
            linear: true,
            repeat_u: true,
            repeat_v: true,
        }
    }

    /// Linear filtering, repeat on U, clamp on V (for lat-long maps).
    pub fn linear_clamp_v() -> Self {
        Self {
            linear: true,
            repeat_u: true,
            repeat_v: false,
        }
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
    width: u32,
    height: u32,
}

impl Texture {
    /// Creates a new texture from the given [`image::DynamicImage`].
    pub fn from_image(
        gl: &Arc<glow::Context>,
        image: &DynamicImage,
        settings: TextureSettings,
    ) -> Result<Self, String> {
        let (width, height) = image.dimensions();
        let data = image.to_rgba8().into_raw();
        Self::from_rgba(gl, width, height, &data, settings)
    }

    /// Creates a new texture from raw RGBA8 pixel data.
    pub fn from_rgba(
        gl: &Arc<glow::Context>,
        width: u32,
        height: u32,
        data: &[u8],
        settings: TextureSettings,
    ) -> Result<Self, String> {
        let filter = if settings.linear {
            glow::LINEAR
        } else {
            glow::NEAREST
        };
        let wrap = |repeat: bool| {
            if repeat {
                glow::REPEAT
            } else {
                glow::CLAMP_TO_EDGE
            }
        };
        unsafe {
            let texture = gl.create_texture().map_err(|e| e.to_string())?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data)),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                wrap(settings.repeat_u) as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                wrap(settings.repeat_v) as i32,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(Self {
                gl: Arc::clone(gl),
                id: texture,
                width,
                height,
            })
        }
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }

    /// Unbinds whatever texture is on the specified unit.
    pub fn unbind(gl: &glow::Context, unit: u32) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}
