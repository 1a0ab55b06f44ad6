//! Thin abstraction layer over SDL2 and OpenGL.
//!
//! Everything that owns a raw GL handle lives here; each wrapper releases its
//! handle on drop so nothing outlives the context by accident.

pub mod app;
pub mod framebuffer;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use app::*;
pub use framebuffer::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
