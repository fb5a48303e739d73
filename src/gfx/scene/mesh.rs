use std::ops::Range;

use thiserror::Error;
use wgpu::{util::DeviceExt, Device};

use super::vertex::attribute_ranges;
use crate::gfx::resources::texture_cache::TextureId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error(
        "attribute arrays differ in length: {positions} positions, {tex_coords} texcoords, {normals} normals"
    )]
    LengthMismatch {
        positions: usize,
        tex_coords: usize,
        normals: usize,
    },

    #[error("index {index} at position {at} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        at: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
}

/// CPU-side geometry of one drawable primitive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.positions.len();
        if self.tex_coords.len() != vertex_count || self.normals.len() != vertex_count {
            return Err(MeshError::LengthMismatch {
                positions: vertex_count,
                tex_coords: self.tex_coords.len(),
                normals: self.normals.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(self.indices.len()));
        }
        if let Some(at) = self
            .indices
            .iter()
            .position(|&index| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                at,
                index: self.indices[at],
                vertex_count,
            });
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() || self.positions.is_empty()
    }

    /// Smooth per-vertex normals for meshes imported without any
    ///
    /// Face normals are the unnormalised cross product of two edges, so larger
    /// triangles weigh more in the average. Out-of-range triangles are skipped;
    /// vertices no triangle touches get a zero normal.
    pub fn calculate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }
            let (v0, v1, v2) = (positions[i0], positions[i1], positions[i2]);

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for index in [i0, i1, i2] {
                for axis in 0..3 {
                    normals[index][axis] += face_normal[axis];
                }
            }
        }

        for normal in &mut normals {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                for component in normal.iter_mut() {
                    *component /= length;
                }
            }
        }

        normals
    }

    /// Positions, texcoords and normals packed back to back
    fn vertex_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.vertex_count() * 8 * std::mem::size_of::<f32>());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.positions));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.tex_coords));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.normals));
        bytes
    }
}

/// Uploaded geometry: one vertex buffer split in three attribute regions plus
/// a `u32` index buffer
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    attribute_ranges: [Range<wgpu::BufferAddress>; 3],
    index_count: u32,
    texture: Option<TextureId>,
}

impl Mesh {
    pub fn upload(
        device: &Device,
        data: &MeshData,
        texture: Option<TextureId>,
    ) -> Result<Self, MeshError> {
        data.validate()?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: &data.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            attribute_ranges: attribute_ranges(data.vertex_count()),
            index_count: data.indices.len() as u32,
            texture,
        })
    }

    pub fn vertex_slice(&self, slot: usize) -> wgpu::BufferSlice<'_> {
        self.vertex_buffer.slice(self.attribute_ranges[slot].clone())
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }
}
