// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary STL encoder
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (0)
//! end
//! ```

use crate::error::{Error, Result};
use crate::millimeter_mesh;
use signlite_geometry::{Mesh, Point3, Solid, Vector3};
use std::io::Write;

/// STL binary header size in bytes
pub const HEADER_SIZE: usize = 80;

/// Size of one triangle record (normal + 3 vertices + attribute)
pub const TRIANGLE_SIZE: usize = 50;

const HEADER_TEXT: &[u8] = b"Binary STL generated by SignLite";

/// Encode a solid as binary STL in millimeters
pub fn encode_stl(solid: &Solid) -> Result<Vec<u8>> {
    let mesh = millimeter_mesh(solid);
    if mesh.is_empty() {
        return Err(Error::EmptyMesh("solid has no triangles".to_string()));
    }
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + mesh.triangle_count() * TRIANGLE_SIZE);
    write_stl(&mesh, &mut out)?;
    Ok(out)
}

/// Write an already scaled mesh as binary STL
pub fn write_stl<W: Write>(mesh: &Mesh, mut writer: W) -> Result<()> {
    let mut header = [b' '; HEADER_SIZE];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;

    // Vertex indices are u32, so the triangle count always fits
    writer.write_all(&(mesh.triangle_count() as u32).to_le_bytes())?;

    for [v0, v1, v2] in mesh.triangles() {
        let normal = (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros);

        write_vector(&mut writer, normal.x, normal.y, normal.z)?;
        write_point(&mut writer, &v0)?;
        write_point(&mut writer, &v1)?;
        write_point(&mut writer, &v2)?;
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

#[inline]
fn write_point<W: Write>(writer: &mut W, p: &Point3<f64>) -> Result<()> {
    write_vector(writer, p.x, p.y, p.z)
}

#[inline]
fn write_vector<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> Result<()> {
    writer.write_all(&(x as f32).to_le_bytes())?;
    writer.write_all(&(y as f32).to_le_bytes())?;
    writer.write_all(&(z as f32).to_le_bytes())?;
    Ok(())
}
