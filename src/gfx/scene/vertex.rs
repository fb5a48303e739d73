//! # Vertex Attribute Layout
//!
//! Vertices are stored per attribute rather than interleaved: one buffer holds
//! every position, then every texture coordinate, then every normal. Each
//! region is bound to its own vertex-buffer slot, and the slot number doubles
//! as the shader location:
//!
//! | slot / location | attribute | format      |
//! |-----------------|-----------|-------------|
//! | 0               | position  | `Float32x3` |
//! | 1               | texcoord  | `Float32x2` |
//! | 2               | normal    | `Float32x3` |

pub const POSITION_SLOT: u32 = 0;
pub const TEXCOORD_SLOT: u32 = 1;
pub const NORMAL_SLOT: u32 = 2;

static POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
static TEXCOORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
static NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

pub const POSITION_SIZE: wgpu::BufferAddress = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;
pub const TEXCOORD_SIZE: wgpu::BufferAddress = std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress;
pub const NORMAL_SIZE: wgpu::BufferAddress = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;

/// Buffer layouts for slots 0, 1 and 2, in that order
///
/// Every mesh pipeline declares all three; shaders that ignore an attribute
/// (the shadow pass only reads positions) simply leave its location unused.
pub fn attribute_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: POSITION_SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: TEXCOORD_SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: NORMAL_SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        },
    ]
}

/// Byte ranges of the three attribute regions for `vertex_count` vertices
pub fn attribute_ranges(vertex_count: usize) -> [std::ops::Range<wgpu::BufferAddress>; 3] {
    let count = vertex_count as wgpu::BufferAddress;
    let positions_end = count * POSITION_SIZE;
    let texcoords_end = positions_end + count * TEXCOORD_SIZE;
    let normals_end = texcoords_end + count * NORMAL_SIZE;
    [
        0..positions_end,
        positions_end..texcoords_end,
        texcoords_end..normals_end,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_ranges_are_contiguous() {
        let [positions, texcoords, normals] = attribute_ranges(4);
        assert_eq!(positions, 0..48);
        assert_eq!(texcoords, 48..80);
        assert_eq!(normals, 80..128);
    }

    #[test]
    fn test_slots_match_shader_locations() {
        let layouts = attribute_layouts();
        for (slot, layout) in layouts.iter().enumerate() {
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, slot as u32);
            assert_eq!(layout.attributes[0].offset, 0);
        }
        assert_eq!(layouts[POSITION_SLOT as usize].array_stride, 12);
        assert_eq!(layouts[TEXCOORD_SLOT as usize].array_stride, 8);
        assert_eq!(layouts[NORMAL_SLOT as usize].array_stride, 12);
    }
}
