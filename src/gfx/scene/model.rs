use std::path::{Path, PathBuf};

use cgmath::{Deg, Matrix4, Vector3};
use thiserror::Error;

use super::mesh::{Mesh, MeshData, MeshError};
use super::vertex::{NORMAL_SLOT, POSITION_SLOT, TEXCOORD_SLOT};
use crate::gfx::resources::{
    global_bindings::{ModelUniform, SceneLayouts, UniformBinding},
    texture_cache::{ImageDecoder, TextureCache, TextureError},
    texture_resource::TextureResource,
};
use crate::wgpu_utils::binding_builder::BindGroupBuilder;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to import '{}'", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("sub-mesh {index} of '{}' is malformed", path.display())]
    Mesh {
        path: PathBuf,
        index: usize,
        #[source]
        source: MeshError,
    },

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Translation, Euler rotation in degrees and per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Vector3<f32>,
    /// Degrees around X, then Y, then Z
    pub rotate: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Vector3::new(0.0, 0.0, 0.0),
            rotate: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn new(translate: Vector3<f32>, rotate: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            translate,
            rotate,
            scale,
        }
    }

    /// `T * Rx * Ry * Rz * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translate)
            * Matrix4::from_angle_x(Deg(self.rotate.x))
            * Matrix4::from_angle_y(Deg(self.rotate.y))
            * Matrix4::from_angle_z(Deg(self.rotate.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// One sub-mesh as read from a model file
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub data: MeshData,
    /// Resolved against the model file's directory
    pub diffuse_texture: Option<PathBuf>,
}

/// Reads every non-empty sub-mesh of an OBJ file
///
/// Missing normals are computed, missing texture coordinates default to
/// `(0, 0)` and V is flipped to the top-left origin of wgpu textures. A missing
/// or broken MTL file only costs the diffuse textures.
pub fn import_obj(path: &Path) -> Result<Vec<ImportedMesh>, LoadError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| LoadError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!(
            "no usable materials for {} ({err}), meshes fall back to white",
            path.display()
        );
        Vec::new()
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut meshes = Vec::with_capacity(models.len());
    for (index, model) in models.into_iter().enumerate() {
        let mesh = model.mesh;
        if mesh.indices.is_empty() || mesh.positions.is_empty() {
            log::warn!(
                "skipping empty sub-mesh {index} ('{}') of {}",
                model.name,
                path.display()
            );
            continue;
        }

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        } else {
            log::debug!("computing normals for sub-mesh {index} of {}", path.display());
            MeshData::calculate_normals(&positions, &mesh.indices)
        };

        let tex_coords = if mesh.texcoords.len() / 2 == positions.len() {
            mesh.texcoords
                .chunks_exact(2)
                .map(|uv| [uv[0], 1.0 - uv[1]])
                .collect()
        } else {
            vec![[0.0, 0.0]; positions.len()]
        };

        let data = MeshData {
            positions,
            tex_coords,
            normals,
            indices: mesh.indices,
        };
        data.validate().map_err(|source| LoadError::Mesh {
            path: path.to_path_buf(),
            index,
            source,
        })?;

        let diffuse_texture = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|material| material.diffuse_texture.as_deref())
            .filter(|name| !name.is_empty())
            .map(|name| base_dir.join(name.replace('\\', "/")));

        meshes.push(ImportedMesh {
            name: model.name,
            data,
            diffuse_texture,
        });
    }

    Ok(meshes)
}

/// Everything model loading needs from the renderer
pub struct LoadContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layouts: &'a SceneLayouts,
    pub decoder: &'a dyn ImageDecoder,
}

/// Diffuse texture of a mesh with its group 2 bind group
pub struct MeshTexture {
    pub texture: TextureResource,
    pub bind_group: wgpu::BindGroup,
}

impl MeshTexture {
    pub fn new(device: &wgpu::Device, layouts: &SceneLayouts, texture: TextureResource, label: &str) -> Self {
        let bind_group = BindGroupBuilder::new(&layouts.mesh_texture)
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, label);
        Self {
            texture,
            bind_group,
        }
    }
}

/// A drawable object: meshes, a transform and the textures they reference
pub struct Model {
    pub name: String,
    pub transform: Transform,
    meshes: Vec<Mesh>,
    textures: TextureCache<MeshTexture>,
    /// `None` until the model is attached to a device
    uniform: Option<UniformBinding<ModelUniform>>,
}

impl Model {
    /// Model without geometry or GPU resources
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            meshes: Vec::new(),
            textures: TextureCache::new(),
            uniform: None,
        }
    }

    /// Imports `path`, loads its textures and uploads every mesh
    pub fn load(path: &Path, transform: Transform, ctx: &LoadContext) -> Result<Self, LoadError> {
        let imported = import_obj(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut model = Self::from_meshes(name, transform, Vec::new(), ctx.device, ctx.layouts);
        let max_dimension = ctx.device.limits().max_texture_dimension_2d;
        for (index, sub_mesh) in imported.iter().enumerate() {
            let texture = match &sub_mesh.diffuse_texture {
                Some(texture_path) => Some(model.textures.get_or_load(
                    texture_path,
                    ctx.decoder,
                    max_dimension,
                    |texture_path, image| {
                        let label = texture_path.display().to_string();
                        let resource =
                            TextureResource::create_from_image(ctx.device, ctx.queue, image, &label);
                        MeshTexture::new(ctx.device, ctx.layouts, resource, &label)
                    },
                )?),
                None => None,
            };

            let mesh = Mesh::upload(ctx.device, &sub_mesh.data, texture).map_err(|source| {
                LoadError::Mesh {
                    path: path.to_path_buf(),
                    index,
                    source,
                }
            })?;
            model.meshes.push(mesh);
        }

        log::info!(
            "loaded {} ({} meshes, {} textures)",
            path.display(),
            model.meshes.len(),
            model.textures.len()
        );
        Ok(model)
    }

    /// Wraps already uploaded meshes, e.g. the skybox cube or screen quad
    pub fn from_meshes(
        name: impl Into<String>,
        transform: Transform,
        meshes: Vec<Mesh>,
        device: &wgpu::Device,
        layouts: &SceneLayouts,
    ) -> Self {
        let name = name.into();
        let uniform = UniformBinding::new(
            device,
            &layouts.model,
            &ModelUniform::new(transform.matrix()),
            &format!("{name} Model Uniform"),
        );
        Self {
            name,
            transform,
            meshes,
            textures: TextureCache::new(),
            uniform: Some(uniform),
        }
    }

    /// Writes the world matrix of the current transform
    pub fn prepare(&mut self, queue: &wgpu::Queue) {
        let matrix = self.transform.matrix();
        if let Some(uniform) = &mut self.uniform {
            uniform.update(queue, ModelUniform::new(matrix));
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn texture_bind_group(&self, mesh: &Mesh) -> Option<&wgpu::BindGroup> {
        mesh.texture()
            .and_then(|id| self.textures.get(id))
            .map(|texture| &texture.bind_group)
    }
}

/// Texture binding the active pipeline expects at group 2
#[derive(Clone, Copy)]
pub enum MeshTextures<'a> {
    /// Depth-only or custom passes
    None,
    /// Each mesh's diffuse map, `fallback` for meshes without one
    Diffuse { fallback: &'a wgpu::BindGroup },
}

pub const MODEL_GROUP: u32 = 1;
pub const MESH_TEXTURE_GROUP: u32 = 2;

pub trait DrawModel<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_model(&mut self, model: &'a Model, textures: MeshTextures<'a>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.set_vertex_buffer(POSITION_SLOT, mesh.vertex_slice(POSITION_SLOT as usize));
        self.set_vertex_buffer(TEXCOORD_SLOT, mesh.vertex_slice(TEXCOORD_SLOT as usize));
        self.set_vertex_buffer(NORMAL_SLOT, mesh.vertex_slice(NORMAL_SLOT as usize));
        self.set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count(), 0, 0..1);
    }

    fn draw_model(&mut self, model: &'b Model, textures: MeshTextures<'b>) {
        let Some(uniform) = &model.uniform else {
            return; // never attached to a device
        };
        self.set_bind_group(MODEL_GROUP, uniform.bind_group(), &[]);

        for mesh in &model.meshes {
            if let MeshTextures::Diffuse { fallback } = textures {
                let bind_group = model.texture_bind_group(mesh).unwrap_or(fallback);
                self.set_bind_group(MESH_TEXTURE_GROUP, bind_group, &[]);
            }
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};
    use std::fs;

    fn assert_matrix_close(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
            }
        }
    }

    /// Writes `contents` to a fresh directory under the system temp dir
    fn write_temp(dir_name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deferred-renderer-{dir_name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        for (name, contents) in files {
            fs::write(dir.join(name), contents).unwrap();
        }
        dir
    }

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl bark
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_identity_transform() {
        assert_matrix_close(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_matrix_composes_translate_rotate_scale() {
        let transform = Transform::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(30.0, 45.0, 60.0),
            Vector3::new(2.0, 3.0, 4.0),
        );
        let expected = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from_angle_x(Deg(30.0))
            * Matrix4::from_angle_y(Deg(45.0))
            * Matrix4::from_angle_z(Deg(60.0))
            * Matrix4::from_nonuniform_scale(2.0, 3.0, 4.0);
        assert_matrix_close(transform.matrix(), expected);

        // rotation order matters: Z applied first to a point on X
        let rotated = Transform::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(90.0, 0.0, 90.0),
            Vector3::new(1.0, 1.0, 1.0),
        )
        .matrix()
            * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((rotated.x).abs() < 1e-5);
        assert!((rotated.y).abs() < 1e-5);
        assert!((rotated.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_translation_only_changes_last_column() {
        let mut transform = Transform::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 180.0, 0.0),
            Vector3::new(0.008, 0.008, 0.008),
        );
        let before = transform.matrix();
        transform.translate = Vector3::new(1.0, 4.0, 17.0);
        let after = transform.matrix();

        assert_matrix_close(
            Matrix4::from_cols(after.x, after.y, after.z, before.w),
            before,
        );
        assert_eq!(after.w, Vector4::new(1.0, 4.0, 17.0, 1.0));
    }

    #[test]
    fn test_import_obj_with_material() {
        let dir = write_temp(
            "import",
            &[
                ("quad.obj", QUAD_OBJ),
                ("quad.mtl", "newmtl bark\nKd 1 1 1\nmap_Kd textures\\bark.png\n"),
            ],
        );

        let meshes = import_obj(&dir.join("quad.obj")).unwrap();
        assert_eq!(meshes.len(), 1);

        let quad = &meshes[0];
        assert_eq!(quad.data.triangle_count(), 2);
        assert!(quad.data.indices.iter().all(|&i| (i as usize) < quad.data.vertex_count()));
        assert_eq!(
            quad.diffuse_texture.as_deref(),
            Some(dir.join("textures/bark.png").as_path())
        );

        // V flipped to the top-left origin
        let first = quad.data.positions.iter().position(|p| *p == [-1.0, -1.0, 0.0]).unwrap();
        assert_eq!(quad.data.tex_coords[first], [0.0, 1.0]);
        assert_eq!(quad.data.normals[first], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_import_without_mtl_or_normals() {
        let obj = "mtllib missing.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let dir = write_temp("no-mtl", &[("tri.obj", obj)]);

        let meshes = import_obj(&dir.join("tri.obj")).unwrap();
        assert_eq!(meshes.len(), 1);
        let tri = &meshes[0];
        assert!(tri.diffuse_texture.is_none());
        assert_eq!(tri.data.tex_coords, vec![[0.0, 0.0]; 3]);
        for normal in &tri.data.normals {
            assert!((normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_import_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("deferred-renderer-does-not-exist.obj");
        assert!(matches!(import_obj(&path), Err(LoadError::Import { .. })));
    }

    #[test]
    fn test_empty_model_has_no_meshes() {
        let model = Model::empty("marker");
        assert!(model.meshes().is_empty());
        assert_eq!(model.texture_count(), 0);
        assert_eq!(model.transform, Transform::default());
    }
}
