//! Binary geometry cache.
//!
//! Generating and loading shapes is the slow part of startup, so the results
//! are streamed to disk as a sequence of records in a fixed shape order and
//! read straight back on later runs. The file opens with a magic and format
//! version; any mismatch is a cache miss, never a silent mis-parse.

use std::io::{self, Read, Write};

use glam::{Vec2, Vec3, Vec4};

use crate::abs::{PrimitiveMode, VertexFormat};

use super::GeometryData;

pub const CACHE_MAGIC: [u8; 4] = *b"PVGC";
pub const CACHE_VERSION: u32 = 1;

fn bad_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_f32s<W: Write>(writer: &mut W, values: &[f32]) -> io::Result<()> {
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn read_f32s<R: Read>(reader: &mut R, count: usize) -> io::Result<Vec<f32>> {
    let mut buf = [0u8; 4];
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        reader.read_exact(&mut buf)?;
        values.push(f32::from_le_bytes(buf));
    }
    Ok(values)
}

fn format_tag(format: VertexFormat) -> u8 {
    match format {
        VertexFormat::Position => 0,
        VertexFormat::PositionColor => 1,
        VertexFormat::PositionTexcoord => 2,
        VertexFormat::PositionNormalTexcoord => 3,
    }
}

fn format_from_tag(tag: u8) -> io::Result<VertexFormat> {
    match tag {
        0 => Ok(VertexFormat::Position),
        1 => Ok(VertexFormat::PositionColor),
        2 => Ok(VertexFormat::PositionTexcoord),
        3 => Ok(VertexFormat::PositionNormalTexcoord),
        _ => Err(bad_data("unknown vertex format tag")),
    }
}

/// Writes the cache header followed by each shape record in order.
pub fn write_cache<W: Write>(writer: &mut W, shapes: &[GeometryData]) -> io::Result<()> {
    writer.write_all(&CACHE_MAGIC)?;
    write_u32(writer, CACHE_VERSION)?;
    write_u32(writer, shapes.len() as u32)?;
    for shape in shapes {
        write_record(writer, shape)?;
    }
    Ok(())
}

/// Reads back exactly `expected` shape records, validating the header first.
pub fn read_cache<R: Read>(reader: &mut R, expected: usize) -> io::Result<Vec<GeometryData>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != CACHE_MAGIC {
        return Err(bad_data("not a geometry cache file"));
    }
    let version = read_u32(reader)?;
    if version != CACHE_VERSION {
        return Err(bad_data("geometry cache version mismatch"));
    }
    let count = read_u32(reader)? as usize;
    if count != expected {
        return Err(bad_data("geometry cache shape count mismatch"));
    }
    let mut shapes = Vec::with_capacity(count);
    for _ in 0..count {
        shapes.push(read_record(reader)?);
    }
    Ok(shapes)
}

fn write_record<W: Write>(writer: &mut W, shape: &GeometryData) -> io::Result<()> {
    writer.write_all(&[
        format_tag(shape.format),
        match shape.mode {
            PrimitiveMode::Triangles => 0,
            PrimitiveMode::Lines => 1,
        },
    ])?;
    write_u32(writer, shape.positions.len() as u32)?;
    write_u32(writer, shape.normals.len() as u32)?;
    write_u32(writer, shape.colors.len() as u32)?;
    write_u32(writer, shape.texcoords.len() as u32)?;
    write_u32(writer, shape.indices.len() as u32)?;
    for v in &shape.positions {
        write_f32s(writer, &v.to_array())?;
    }
    for v in &shape.normals {
        write_f32s(writer, &v.to_array())?;
    }
    for v in &shape.colors {
        write_f32s(writer, &v.to_array())?;
    }
    for v in &shape.texcoords {
        write_f32s(writer, &v.to_array())?;
    }
    for index in &shape.indices {
        write_u32(writer, *index)?;
    }
    Ok(())
}

fn read_record<R: Read>(reader: &mut R) -> io::Result<GeometryData> {
    let mut tags = [0u8; 2];
    reader.read_exact(&mut tags)?;
    let format = format_from_tag(tags[0])?;
    let mode = match tags[1] {
        0 => PrimitiveMode::Triangles,
        1 => PrimitiveMode::Lines,
        _ => return Err(bad_data("unknown primitive mode tag")),
    };
    let position_count = read_u32(reader)? as usize;
    let normal_count = read_u32(reader)? as usize;
    let color_count = read_u32(reader)? as usize;
    let texcoord_count = read_u32(reader)? as usize;
    let index_count = read_u32(reader)? as usize;

    let positions = read_f32s(reader, position_count * 3)?
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect();
    let normals = read_f32s(reader, normal_count * 3)?
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect();
    let colors = read_f32s(reader, color_count * 4)?
        .chunks_exact(4)
        .map(|c| Vec4::new(c[0], c[1], c[2], c[3]))
        .collect();
    let texcoords = read_f32s(reader, texcoord_count * 2)?
        .chunks_exact(2)
        .map(|c| Vec2::new(c[0], c[1]))
        .collect();
    let mut indices = Vec::with_capacity(index_count);
    for _ in 0..index_count {
        indices.push(read_u32(reader)?);
    }

    Ok(GeometryData {
        format,
        mode,
        positions,
        normals,
        colors,
        texcoords,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::super::{ShapeDescriptor, generate};
    use super::*;

    fn sample_shapes() -> Vec<GeometryData> {
        vec![
            generate(&ShapeDescriptor::Axes),
            generate(&ShapeDescriptor::Sphere {
                radius: 2.0,
                slices: 8,
                stacks: 6,
            }),
            generate(&ShapeDescriptor::TexturedQuad {
                width: 2.0,
                height: 2.0,
            }),
        ]
    }

    #[test]
    fn cache_round_trips() {
        let shapes = sample_shapes();
        let mut buf = Vec::new();
        write_cache(&mut buf, &shapes).unwrap();
        let loaded = read_cache(&mut Cursor::new(&buf), shapes.len()).unwrap();
        assert_eq!(loaded, shapes);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let shapes = sample_shapes();
        let mut buf = Vec::new();
        write_cache(&mut buf, &shapes).unwrap();
        buf[0] = b'x';
        let err = read_cache(&mut Cursor::new(&buf), shapes.len()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let shapes = sample_shapes();
        let mut buf = Vec::new();
        write_cache(&mut buf, &shapes).unwrap();
        buf[4..8].copy_from_slice(&(CACHE_VERSION + 1).to_le_bytes());
        let err = read_cache(&mut Cursor::new(&buf), shapes.len()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn wrong_shape_count_is_rejected() {
        let shapes = sample_shapes();
        let mut buf = Vec::new();
        write_cache(&mut buf, &shapes).unwrap();
        let err = read_cache(&mut Cursor::new(&buf), shapes.len() + 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_cache_is_an_io_error() {
        let shapes = sample_shapes();
        let mut buf = Vec::new();
        write_cache(&mut buf, &shapes).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(read_cache(&mut Cursor::new(&buf), shapes.len()).is_err());
    }
}
