use crate::gfx::scene::MeshData;

/// Two triangles covering clip space, z = 0
///
/// Texture coordinates use the top-left origin of wgpu textures.
pub fn screen_quad() -> MeshData {
    MeshData {
        positions: vec![
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 2, 1, 3],
    }
}

/// Cube spanning [-1, 1] on every axis, 8 shared corners
///
/// The skybox shader derives its cube-map lookup direction from the position,
/// so texcoords are unused and normals are the corner directions.
pub fn skybox_cube() -> MeshData {
    let positions: Vec<[f32; 3]> = vec![
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
    ];
    let normals = positions
        .iter()
        .map(|p| {
            let inv = 1.0 / 3.0f32.sqrt();
            [p[0] * inv, p[1] * inv, p[2] * inv]
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 3, 1,  0, 2, 3,
        1, 5, 4,  1, 4, 0,
        4, 2, 0,  4, 6, 2,
        5, 6, 4,  5, 7, 6,
        2, 6, 7,  2, 7, 3,
        1, 7, 5,  1, 3, 7,
    ];

    MeshData {
        tex_coords: vec![[0.0, 0.0]; positions.len()],
        normals,
        positions,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_quad() {
        let quad = screen_quad();
        assert!(quad.validate().is_ok());
        assert_eq!(quad.indices, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(quad.triangle_count(), 2);
    }

    #[test]
    fn test_skybox_cube_covers_every_face() {
        let cube = skybox_cube();
        assert!(cube.validate().is_ok());
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.triangle_count(), 12);

        for corner in 0..8u32 {
            assert!(cube.indices.contains(&corner));
        }
    }
}
