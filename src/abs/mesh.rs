//! GPU-side geometry storage.
//!
//! All drawables in the demo share one vertex buffer and one index buffer
//! ([`BufferPool`]); each [`Drawable`] is a vertex-format plus a range within
//! that shared storage. The pool is reference counted, so the buffers are
//! released only after the last drawable referencing them is dropped.

use std::sync::Arc;

use glow::HasContext;

/// The closed set of interleaved vertex layouts used by the demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    /// position (vec3)
    Position,
    /// position (vec3), color (vec4)
    PositionColor,
    /// position (vec3), texcoord (vec2)
    PositionTexcoord,
    /// position (vec3), normal (vec3), texcoord (vec2)
    PositionNormalTexcoord,
}

impl VertexFormat {
    pub fn floats_per_vertex(self) -> usize {
        match self {
            VertexFormat::Position => 3,
            VertexFormat::PositionColor => 7,
            VertexFormat::PositionTexcoord => 5,
            VertexFormat::PositionNormalTexcoord => 8,
        }
    }

    pub fn stride_bytes(self) -> usize {
        self.floats_per_vertex() * std::mem::size_of::<f32>()
    }

    /// Sets up attribute pointers for vertices stored at `base_offset` bytes
    /// into the currently bound vertex buffer. Attribute locations are shared
    /// with every shader in `src/render/shaders`.
    fn setup_attribs(self, gl: &glow::Context, base_offset: i32) {
        let stride = self.stride_bytes() as i32;
        unsafe {
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, base_offset);
            match self {
                VertexFormat::Position => {}
                VertexFormat::PositionColor => {
                    gl.enable_vertex_attrib_array(1);
                    gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, base_offset + 12);
                }
                VertexFormat::PositionTexcoord => {
                    gl.enable_vertex_attrib_array(1);
                    gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, base_offset + 12);
                }
                VertexFormat::PositionNormalTexcoord => {
                    gl.enable_vertex_attrib_array(1);
                    gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, base_offset + 12);
                    gl.enable_vertex_attrib_array(2);
                    gl.vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, base_offset + 24);
                }
            }
        }
    }
}

/// How a drawable's indices are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
}

impl PrimitiveMode {
    pub fn gl_mode(self) -> u32 {
        match self {
            PrimitiveMode::Triangles => glow::TRIANGLES,
            PrimitiveMode::Lines => glow::LINES,
        }
    }
}

/// Computes the packing of `(vertex_bytes, index_count)` entries into one
/// shared buffer pair. Returns per-entry `(vertex_offset, index_offset)` byte
/// offsets plus the total vertex and index storage required.
pub fn pool_layout(entries: &[(usize, usize)]) -> (Vec<(usize, usize)>, usize, usize) {
    let mut offsets = Vec::with_capacity(entries.len());
    let mut vertex_total = 0;
    let mut index_total = 0;
    for &(vertex_bytes, index_count) in entries {
        offsets.push((vertex_total, index_total));
        vertex_total += vertex_bytes;
        index_total += index_count * std::mem::size_of::<u32>();
    }
    (offsets, vertex_total, index_total)
}

/// The raw buffer pair, deleted when the last owner lets go.
struct PoolBuffers {
    gl: Arc<glow::Context>,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
}

impl Drop for PoolBuffers {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ibo);
        }
    }
}

/// A shared vertex/index buffer pair that drawables are carved out of.
pub struct BufferPool {
    gl: Arc<glow::Context>,
    buffers: Arc<PoolBuffers>,
    vertex_capacity: usize,
    index_capacity: usize,
    vertex_used: usize,
    index_used: usize,
}

impl BufferPool {
    /// Allocates a pool with the given storage sizes in bytes.
    pub fn new(gl: &Arc<glow::Context>, vertex_bytes: usize, index_bytes: usize) -> Result<Self, String> {
        unsafe {
            let vbo = gl.create_buffer().map_err(|e| e.to_string())?;
            let ibo = gl.create_buffer().map_err(|e| e.to_string())?;

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_size(glow::ARRAY_BUFFER, vertex_bytes as i32, glow::STATIC_DRAW);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_size(glow::ELEMENT_ARRAY_BUFFER, index_bytes as i32, glow::STATIC_DRAW);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(Self {
                gl: Arc::clone(gl),
                buffers: Arc::new(PoolBuffers {
                    gl: Arc::clone(gl),
                    vbo,
                    ibo,
                }),
                vertex_capacity: vertex_bytes,
                index_capacity: index_bytes,
                vertex_used: 0,
                index_used: 0,
            })
        }
    }

    /// Uploads one shape's interleaved vertices and indices at the current
    /// write offsets and returns a drawable referencing that range.
    pub fn push(
        &mut self,
        format: VertexFormat,
        mode: PrimitiveMode,
        vertex_data: &[f32],
        indices: &[u32],
    ) -> Result<Drawable, String> {
        let vertex_bytes = std::mem::size_of_val(vertex_data);
        let index_bytes = std::mem::size_of_val(indices);
        if self.vertex_used + vertex_bytes > self.vertex_capacity
            || self.index_used + index_bytes > self.index_capacity
        {
            return Err("buffer pool storage exceeded".to_string());
        }

        let gl = &self.gl;
        unsafe {
            let vao = gl.create_vertex_array().map_err(|e| e.to_string())?;
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffers.vbo));
            gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                self.vertex_used as i32,
                std::slice::from_raw_parts(vertex_data.as_ptr() as *const u8, vertex_bytes),
            );
            format.setup_attribs(gl, self.vertex_used as i32);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.buffers.ibo));
            gl.buffer_sub_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                self.index_used as i32,
                std::slice::from_raw_parts(indices.as_ptr() as *const u8, index_bytes),
            );

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            let drawable = Drawable {
                gl: Arc::clone(&self.gl),
                _buffers: Arc::clone(&self.buffers),
                vao,
                mode: mode.gl_mode(),
                index_count: indices.len() as i32,
                index_offset: self.index_used as i32,
            };
            self.vertex_used += vertex_bytes;
            self.index_used += index_bytes;
            Ok(drawable)
        }
    }
}

/// An immutable vertex-format + range reference into shared buffer storage.
pub struct Drawable {
    gl: Arc<glow::Context>,
    _buffers: Arc<PoolBuffers>,
    vao: glow::VertexArray,
    mode: u32,
    index_count: i32,
    index_offset: i32,
}

impl Drawable {
    /// Issues the draw call for this range.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl
                .draw_elements(self.mode, self.index_count, glow::UNSIGNED_INT, self.index_offset);
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for Drawable {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_layout_is_contiguous() {
        let entries = [(96, 12), (200, 30), (64, 6)];
        let (offsets, vertex_total, index_total) = pool_layout(&entries);
        assert_eq!(offsets, vec![(0, 0), (96, 48), (296, 168)]);
        assert_eq!(vertex_total, 360);
        assert_eq!(index_total, 192);
    }

    #[test]
    fn pool_layout_totals_match_sum() {
        let entries = [(32, 3), (0, 0), (128, 96)];
        let (offsets, vertex_total, index_total) = pool_layout(&entries);
        assert_eq!(vertex_total, entries.iter().map(|e| e.0).sum::<usize>());
        assert_eq!(
            index_total,
            entries.iter().map(|e| e.1 * 4).sum::<usize>()
        );
        // no entry starts before the previous one ends
        for pair in offsets.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn vertex_format_strides() {
        assert_eq!(VertexFormat::Position.stride_bytes(), 12);
        assert_eq!(VertexFormat::PositionColor.stride_bytes(), 28);
        assert_eq!(VertexFormat::PositionTexcoord.stride_bytes(), 20);
        assert_eq!(VertexFormat::PositionNormalTexcoord.stride_bytes(), 32);
    }
}
