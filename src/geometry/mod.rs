//! Shape geometry: procedural generation and model loading.
//!
//! Shapes are described by a [`ShapeDescriptor`] and generated into CPU-side
//! [`GeometryData`], which is either uploaded into the shared buffer pool or
//! serialized through the binary cache (see [`cache`]). All procedural shapes
//! are authored around +Z as their canonical axis except the box, which is
//! axis-symmetric, and loaded models, which keep their authored axis (the
//! teapot is Y-up). Axis correction happens at render time, not here.

pub mod cache;

use std::f32::consts::{PI, TAU};
use std::path::Path;

use glam::{Vec2, Vec3, Vec4, vec2, vec3};

use crate::abs::{PrimitiveMode, VertexFormat};

/// CPU-side geometry for one shape.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryData {
    pub format: VertexFormat,
    pub mode: PrimitiveMode,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub texcoords: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    fn empty(format: VertexFormat, mode: PrimitiveMode) -> Self {
        Self {
            format,
            mode,
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Bytes of vertex storage this shape needs in the shared pool.
    pub fn vertex_buffer_size(&self) -> usize {
        self.vertex_count() * self.format.stride_bytes()
    }

    /// Interleaves the attribute arrays into the layout `format` describes.
    pub fn interleave(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * self.format.floats_per_vertex());
        for i in 0..self.vertex_count() {
            let p = self.positions[i];
            out.extend_from_slice(&[p.x, p.y, p.z]);
            match self.format {
                VertexFormat::Position => {}
                VertexFormat::PositionColor => {
                    let c = self.colors[i];
                    out.extend_from_slice(&[c.x, c.y, c.z, c.w]);
                }
                VertexFormat::PositionTexcoord => {
                    let t = self.texcoords[i];
                    out.extend_from_slice(&[t.x, t.y]);
                }
                VertexFormat::PositionNormalTexcoord => {
                    let n = self.normals[i];
                    let t = self.texcoords[i];
                    out.extend_from_slice(&[n.x, n.y, n.z, t.x, t.y]);
                }
            }
        }
        out
    }
}

/// Parameters for one procedurally generated shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeDescriptor {
    /// Unit coordinate axes as colored wireframe lines.
    Axes,
    /// Wireframe plane in XY, centered at the origin.
    WirePlane {
        width: f32,
        height: f32,
        divisions_x: u32,
        divisions_y: u32,
    },
    /// Textured quad in XY, centered at the origin.
    TexturedQuad { width: f32, height: f32 },
    /// Textured cube, centered at the origin.
    TexturedBox { size: f32 },
    /// Solid plane in XY facing +Z, centered at the origin.
    SolidPlane {
        width: f32,
        height: f32,
        divisions_x: u32,
        divisions_y: u32,
    },
    /// UV sphere with poles on +/-Z.
    Sphere { radius: f32, slices: u32, stacks: u32 },
    /// Capped cylinder along Z, centered at the origin.
    Cylinder { radius: f32, length: f32, slices: u32 },
    /// Torus around the Z axis.
    Torus {
        major_radius: f32,
        minor_radius: f32,
        slices: u32,
        rings: u32,
    },
}

/// Generates the geometry a descriptor describes.
pub fn generate(descriptor: &ShapeDescriptor) -> GeometryData {
    match *descriptor {
        ShapeDescriptor::Axes => generate_axes(),
        ShapeDescriptor::WirePlane {
            width,
            height,
            divisions_x,
            divisions_y,
        } => generate_wire_plane(width, height, divisions_x, divisions_y),
        ShapeDescriptor::TexturedQuad { width, height } => generate_textured_quad(width, height),
        ShapeDescriptor::TexturedBox { size } => generate_textured_box(size),
        ShapeDescriptor::SolidPlane {
            width,
            height,
            divisions_x,
            divisions_y,
        } => generate_solid_plane(width, height, divisions_x, divisions_y),
        ShapeDescriptor::Sphere {
            radius,
            slices,
            stacks,
        } => generate_sphere(radius, slices, stacks),
        ShapeDescriptor::Cylinder {
            radius,
            length,
            slices,
        } => generate_cylinder(radius, length, slices),
        ShapeDescriptor::Torus {
            major_radius,
            minor_radius,
            slices,
            rings,
        } => generate_torus(major_radius, minor_radius, slices, rings),
    }
}

fn generate_axes() -> GeometryData {
    let mut data = GeometryData::empty(VertexFormat::PositionColor, PrimitiveMode::Lines);
    let axes = [
        (vec3(1.0, 0.0, 0.0), Vec4::new(1.0, 0.0, 0.0, 1.0)),
        (vec3(0.0, 1.0, 0.0), Vec4::new(0.0, 1.0, 0.0, 1.0)),
        (vec3(0.0, 0.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0)),
    ];
    for (tip, color) in axes {
        let base = data.positions.len() as u32;
        data.positions.push(Vec3::ZERO);
        data.positions.push(tip);
        data.colors.push(color);
        data.colors.push(color);
        data.indices.extend_from_slice(&[base, base + 1]);
    }
    data
}

fn generate_wire_plane(width: f32, height: f32, divisions_x: u32, divisions_y: u32) -> GeometryData {
    let mut data = GeometryData::empty(VertexFormat::Position, PrimitiveMode::Lines);
    let (hw, hh) = (width * 0.5, height * 0.5);
    for i in 0..=divisions_x {
        let x = -hw + width * i as f32 / divisions_x as f32;
        let base = data.positions.len() as u32;
        data.positions.push(vec3(x, -hh, 0.0));
        data.positions.push(vec3(x, hh, 0.0));
        data.indices.extend_from_slice(&[base, base + 1]);
    }
    for j in 0..=divisions_y {
        let y = -hh + height * j as f32 / divisions_y as f32;
        let base = data.positions.len() as u32;
        data.positions.push(vec3(-hw, y, 0.0));
        data.positions.push(vec3(hw, y, 0.0));
        data.indices.extend_from_slice(&[base, base + 1]);
    }
    data
}

fn generate_textured_quad(width: f32, height: f32) -> GeometryData {
    let mut data = GeometryData::empty(VertexFormat::PositionTexcoord, PrimitiveMode::Triangles);
    let (hw, hh) = (width * 0.5, height * 0.5);
    data.positions = vec![
        vec3(-hw, -hh, 0.0),
        vec3(hw, -hh, 0.0),
        vec3(hw, hh, 0.0),
        vec3(-hw, hh, 0.0),
    ];
    data.texcoords = vec![
        vec2(0.0, 0.0),
        vec2(1.0, 0.0),
        vec2(1.0, 1.0),
        vec2(0.0, 1.0),
    ];
    data.indices = vec![0, 1, 2, 2, 3, 0];
    data
}

fn generate_textured_box(size: f32) -> GeometryData {
    let mut data = GeometryData::empty(VertexFormat::PositionTexcoord, PrimitiveMode::Triangles);
    let h = size * 0.5;
    // six faces, four vertices each, wound outward
    let faces: [[Vec3; 4]; 6] = [
        [
            vec3(-h, -h, h),
            vec3(h, -h, h),
            vec3(h, h, h),
            vec3(-h, h, h),
        ],
        [
            vec3(h, -h, -h),
            vec3(-h, -h, -h),
            vec3(-h, h, -h),
            vec3(h, h, -h),
        ],
        [
            vec3(-h, -h, -h),
            vec3(-h, -h, h),
            vec3(-h, h, h),
            vec3(-h, h, -h),
        ],
        [
            vec3(h, -h, h),
            vec3(h, -h, -h),
            vec3(h, h, -h),
            vec3(h, h, h),
        ],
        [
            vec3(-h, h, h),
            vec3(h, h, h),
            vec3(h, h, -h),
            vec3(-h, h, -h),
        ],
        [
            vec3(-h, -h, -h),
            vec3(h, -h, -h),
            vec3(h, -h, h),
            vec3(-h, -h, h),
        ],
    ];
    for corners in faces {
        let base = data.positions.len() as u32;
        data.positions.extend_from_slice(&corners);
        data.texcoords.extend_from_slice(&[
            vec2(0.0, 0.0),
            vec2(1.0, 0.0),
            vec2(1.0, 1.0),
            vec2(0.0, 1.0),
        ]);
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    data
}

fn generate_solid_plane(width: f32, height: f32, divisions_x: u32, divisions_y: u32) -> GeometryData {
    let mut data =
        GeometryData::empty(VertexFormat::PositionNormalTexcoord, PrimitiveMode::Triangles);
    let (hw, hh) = (width * 0.5, height * 0.5);
    for j in 0..=divisions_y {
        let v = j as f32 / divisions_y as f32;
        for i in 0..=divisions_x {
            let u = i as f32 / divisions_x as f32;
            data.positions
                .push(vec3(-hw + width * u, -hh + height * v, 0.0));
            data.normals.push(Vec3::Z);
            data.texcoords.push(vec2(u, v));
        }
    }
    let row = divisions_x + 1;
    for j in 0..divisions_y {
        for i in 0..divisions_x {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            data.indices.extend_from_slice(&[a, b, d, d, c, a]);
        }
    }
    data
}

fn generate_sphere(radius: f32, slices: u32, stacks: u32) -> GeometryData {
    let mut data =
        GeometryData::empty(VertexFormat::PositionNormalTexcoord, PrimitiveMode::Triangles);
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    // poles on +/-Z: theta sweeps from the +Z pole
    for stack in 0..=stacks {
        let theta = stack as f32 * PI / stacks as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for slice in 0..=slices {
            let phi = slice as f32 * TAU / slices as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = vec3(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
            data.positions.push(normal * radius);
            data.normals.push(normal);
            data.texcoords.push(vec2(
                slice as f32 / slices as f32,
                stack as f32 / stacks as f32,
            ));
        }
    }
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            data.indices.extend_from_slice(&[a, c, d, d, b, a]);
        }
    }
    data
}

fn generate_cylinder(radius: f32, length: f32, slices: u32) -> GeometryData {
    let mut data =
        GeometryData::empty(VertexFormat::PositionNormalTexcoord, PrimitiveMode::Triangles);
    let slices = slices.max(3);
    let hl = length * 0.5;

    // side wall
    for slice in 0..=slices {
        let phi = slice as f32 * TAU / slices as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let normal = vec3(cos_phi, sin_phi, 0.0);
        let u = slice as f32 / slices as f32;
        data.positions.push(vec3(
            radius * cos_phi,
            radius * sin_phi,
            -hl,
        ));
        data.normals.push(normal);
        data.texcoords.push(vec2(u, 0.0));
        data.positions.push(vec3(radius * cos_phi, radius * sin_phi, hl));
        data.normals.push(normal);
        data.texcoords.push(vec2(u, 1.0));
    }
    for slice in 0..slices {
        let a = slice * 2;
        data.indices
            .extend_from_slice(&[a, a + 2, a + 3, a + 3, a + 1, a]);
    }

    // caps as triangle fans around center vertices
    for (z, normal) in [(-hl, -Vec3::Z), (hl, Vec3::Z)] {
        let center = data.positions.len() as u32;
        data.positions.push(vec3(0.0, 0.0, z));
        data.normals.push(normal);
        data.texcoords.push(vec2(0.5, 0.5));
        for slice in 0..=slices {
            let phi = slice as f32 * TAU / slices as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            data.positions.push(vec3(radius * cos_phi, radius * sin_phi, z));
            data.normals.push(normal);
            data.texcoords
                .push(vec2(0.5 + cos_phi * 0.5, 0.5 + sin_phi * 0.5));
        }
        for slice in 0..slices {
            let a = center + 1 + slice;
            if normal.z > 0.0 {
                data.indices.extend_from_slice(&[center, a, a + 1]);
            } else {
                data.indices.extend_from_slice(&[center, a + 1, a]);
            }
        }
    }
    data
}

fn generate_torus(major_radius: f32, minor_radius: f32, slices: u32, rings: u32) -> GeometryData {
    let mut data =
        GeometryData::empty(VertexFormat::PositionNormalTexcoord, PrimitiveMode::Triangles);
    let slices = slices.max(3);
    let rings = rings.max(3);
    for slice in 0..=slices {
        let phi = slice as f32 * TAU / slices as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for ring in 0..=rings {
            let psi = ring as f32 * TAU / rings as f32;
            let (sin_psi, cos_psi) = psi.sin_cos();
            let radial = vec3(cos_phi, sin_phi, 0.0);
            let normal = radial * cos_psi + Vec3::Z * sin_psi;
            data.positions
                .push(radial * (major_radius + minor_radius * cos_psi) + Vec3::Z * (minor_radius * sin_psi));
            data.normals.push(normal);
            data.texcoords.push(vec2(
                slice as f32 / slices as f32,
                ring as f32 / rings as f32,
            ));
        }
    }
    let row = rings + 1;
    for slice in 0..slices {
        for ring in 0..rings {
            let a = slice * row + ring;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            data.indices.extend_from_slice(&[a, c, d, d, b, a]);
        }
    }
    data
}

/// Loads a triangulated OBJ model, scaling positions uniformly.
pub fn load_obj_model(path: &Path, scale: f32) -> Result<GeometryData, String> {
    let (models, _) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|e| e.to_string())?;
    let mut data =
        GeometryData::empty(VertexFormat::PositionNormalTexcoord, PrimitiveMode::Triangles);
    for model in &models {
        let mesh = &model.mesh;
        let base = data.positions.len() as u32;
        let vertex_count = mesh.positions.len() / 3;
        for i in 0..vertex_count {
            data.positions.push(
                vec3(
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ) * scale,
            );
            if mesh.normals.len() >= (i + 1) * 3 {
                data.normals.push(vec3(
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ));
            } else {
                data.normals
                    .push(data.positions[(base as usize) + i].normalize_or_zero());
            }
            if mesh.texcoords.len() >= (i + 1) * 2 {
                data.texcoords
                    .push(vec2(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]));
            } else {
                data.texcoords.push(Vec2::ZERO);
            }
        }
        data.indices.extend(mesh.indices.iter().map(|i| base + i));
    }
    if data.positions.is_empty() {
        return Err("model contains no geometry".to_string());
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_counts_and_unit_normals() {
        let data = generate(&ShapeDescriptor::Sphere {
            radius: 2.0,
            slices: 32,
            stacks: 24,
        });
        assert_eq!(data.vertex_count(), 33 * 25);
        assert_eq!(data.indices.len(), 32 * 24 * 6);
        for (position, normal) in data.positions.iter().zip(&data.normals) {
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!((position.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn wire_plane_line_count() {
        let data = generate(&ShapeDescriptor::WirePlane {
            width: 20.0,
            height: 20.0,
            divisions_x: 20,
            divisions_y: 20,
        });
        assert_eq!(data.mode, PrimitiveMode::Lines);
        // 21 lines in each direction, two endpoints each
        assert_eq!(data.vertex_count(), 84);
        assert_eq!(data.indices.len(), 84);
    }

    #[test]
    fn solid_plane_faces_positive_z() {
        let data = generate(&ShapeDescriptor::SolidPlane {
            width: 40.0,
            height: 40.0,
            divisions_x: 40,
            divisions_y: 40,
        });
        assert!(data.normals.iter().all(|n| *n == Vec3::Z));
        assert_eq!(data.vertex_count(), 41 * 41);
    }

    #[test]
    fn torus_stays_within_radii() {
        let data = generate(&ShapeDescriptor::Torus {
            major_radius: 2.0,
            minor_radius: 0.5,
            slices: 32,
            rings: 24,
        });
        for position in &data.positions {
            let ring_distance = vec2(position.x, position.y).length();
            assert!(ring_distance <= 2.5 + 1e-4);
            assert!(ring_distance >= 1.5 - 1e-4);
            assert!(position.z.abs() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn interleave_matches_format_stride() {
        let data = generate(&ShapeDescriptor::TexturedQuad {
            width: 2.0,
            height: 2.0,
        });
        let floats = data.interleave();
        assert_eq!(
            floats.len(),
            data.vertex_count() * data.format.floats_per_vertex()
        );
        // second vertex starts with its position
        assert_eq!(floats[5], 1.0);
        assert_eq!(floats[6], -1.0);
    }

    #[test]
    fn indices_stay_in_range() {
        for descriptor in [
            ShapeDescriptor::Axes,
            ShapeDescriptor::TexturedBox { size: 100.0 },
            ShapeDescriptor::Cylinder {
                radius: 1.0,
                length: 4.0,
                slices: 32,
            },
        ] {
            let data = generate(&descriptor);
            let max = data.vertex_count() as u32;
            assert!(data.indices.iter().all(|i| *i < max), "{descriptor:?}");
        }
    }
}
