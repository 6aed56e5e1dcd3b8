use glam::{Mat4, Vec2, Vec3, Vec4};
use lightbake_gpu::{
    environment_mip_offsets, falloff_table, BufferId, BufferView,
    EnvironmentMap, FalloffTables, GammaTexel, Light, LightBuffer,
    LightingView, LinearTexel, MaterialTextureProperties, MaterialsView,
    Matrix4x4, MeshDataOffsets, MeshesView, PackedNormal, TextureAtlas,
    FALLOFF_TABLE_LEN,
};

use crate::{BakeError, BufferCapacities};

/// Triangle mesh, in object space.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

/// Everything kernels read but never write: lights, geometry, materials and
/// the environment map, laid out the way kernels expect them.
///
/// Both executors borrow the scene; the accelerator one uploads it once, when
/// it's created.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub(crate) lights: Vec<LightBuffer>,
    pub(crate) distance_falloffs: Vec<f32>,
    pub(crate) angular_falloffs: Vec<f32>,
    pub(crate) mesh_offsets: Vec<MeshDataOffsets>,
    pub(crate) inv_transposed: Vec<Matrix4x4>,
    pub(crate) uvs: Vec<Vec2>,
    pub(crate) positions: Vec<Vec4>,
    pub(crate) normals: Vec<PackedNormal>,
    pub(crate) indices: Vec<u32>,
    pub(crate) albedo_props: Vec<MaterialTextureProperties>,
    pub(crate) emissive_props: Vec<MaterialTextureProperties>,
    pub(crate) albedo_texels: Vec<GammaTexel>,
    pub(crate) emissive_texels: Vec<LinearTexel>,
    pub(crate) env_texels: Vec<Vec4>,
    pub(crate) env_mip_offsets: Vec<i32>,
    pub(crate) env_dim: i32,
}

impl Scene {
    /// Adds a light; returns its index.
    pub fn add_light(&mut self, light: &Light) -> u32 {
        self.lights.push(light.encode());
        self.lights.len() as u32 - 1
    }

    /// Adds an already-encoded light; returns its index.
    pub fn add_encoded_light(
        &mut self,
        light: LightBuffer,
    ) -> Result<u32, BakeError> {
        if light.kind().is_none() {
            return Err(BakeError::UnknownLightType {
                index: self.lights.len(),
                ty: light.light_type,
            });
        }

        self.lights.push(light);

        Ok(self.lights.len() as u32 - 1)
    }

    pub fn lights(&self) -> &[LightBuffer] {
        &self.lights
    }

    /// Tabulates `f` as a distance falloff; returns the index to store in
    /// point and spot lights.
    ///
    /// `f` is evaluated at `distance / range`, within `[0, 1]`.
    pub fn add_distance_falloff(&mut self, f: impl Fn(f32) -> f32) -> u32 {
        let index = self.distance_falloffs.len() / FALLOFF_TABLE_LEN as usize;

        self.distance_falloffs.extend(falloff_table(f));

        index as u32
    }

    /// Tabulates `f` as the angular falloff, shared by all spot lights.
    pub fn set_angular_falloff(&mut self, f: impl Fn(f32) -> f32) {
        self.angular_falloffs = falloff_table(f).to_vec();
    }

    /// Appends mesh's geometry; returns offsets to pass into
    /// [`Self::add_instance()`].
    pub fn add_mesh(
        &mut self,
        mesh: &Mesh,
    ) -> Result<MeshDataOffsets, BakeError> {
        let vertices = mesh.positions.len();

        BakeError::ensure_len("mesh.normals", vertices, mesh.normals.len())?;
        BakeError::ensure_len("mesh.uvs", vertices, mesh.uvs.len())?;
        BakeError::ensure_len(
            "mesh.indices",
            mesh.indices.len() / 3 * 3,
            mesh.indices.len(),
        )?;

        let offsets = MeshDataOffsets {
            vertex_offset: self.positions.len() as i32,
            index_offset: self.indices.len() as i32,
        };

        self.positions
            .extend(mesh.positions.iter().map(|pos| pos.extend(1.0)));

        self.normals
            .extend(mesh.normals.iter().map(|&n| PackedNormal::encode(n)));

        self.uvs.extend_from_slice(&mesh.uvs);
        self.indices.extend_from_slice(&mesh.indices);

        Ok(offsets)
    }

    /// Adds an instance of a mesh; returns its instance id (i.e. the value
    /// the intersection engine reports as `shape_id - 1`).
    pub fn add_instance(
        &mut self,
        mesh: MeshDataOffsets,
        transform: Mat4,
        albedo: MaterialTextureProperties,
        emission: MaterialTextureProperties,
    ) -> i32 {
        let xform = transform.inverse().transpose();

        self.mesh_offsets.push(mesh);

        self.inv_transposed.push(Matrix4x4 {
            m0: xform.row(0),
            m1: xform.row(1),
            m2: xform.row(2),
            m3: xform.row(3),
        });

        self.albedo_props.push(albedo);
        self.emissive_props.push(emission);
        self.mesh_offsets.len() as i32 - 1
    }

    /// Adds a texture into the albedo atlas.
    ///
    /// Flags of the returned properties are empty (repeat, bilinear).
    pub fn add_albedo_texture(
        &mut self,
        width: u32,
        height: u32,
        texels: &[GammaTexel],
    ) -> Result<MaterialTextureProperties, BakeError> {
        add_texture(&mut self.albedo_texels, width, height, texels)
    }

    /// Adds a texture into the emission atlas.
    ///
    /// Flags of the returned properties are empty (repeat, bilinear).
    pub fn add_emissive_texture(
        &mut self,
        width: u32,
        height: u32,
        texels: &[LinearTexel],
    ) -> Result<MaterialTextureProperties, BakeError> {
        add_texture(&mut self.emissive_texels, width, height, texels)
    }

    /// Sets the environment map: `num_mips` levels of a bordered cube map,
    /// each level storing six `(dim + 2)^2` faces in order +X, -X, +Y, -Y,
    /// +Z, -Z.
    pub fn set_environment(
        &mut self,
        dim: i32,
        num_mips: i32,
        texels: Vec<Vec4>,
    ) -> Result<(), BakeError> {
        let mip_offsets = if dim > 0 && (1..32).contains(&num_mips) {
            environment_mip_offsets(dim, num_mips)
        } else {
            Vec::new()
        };

        let expected = mip_offsets.last().map_or(0, |&offset| {
            let last_mip = dim >> (num_mips - 1);

            (offset + 6 * (last_mip + 2) * (last_mip + 2)) as usize
        });

        if expected == 0 || texels.len() != expected {
            return Err(BakeError::InvalidEnvironment {
                dim,
                num_mips,
                expected,
                actual: texels.len(),
            });
        }

        self.env_texels = texels;
        self.env_mip_offsets = mip_offsets;
        self.env_dim = dim;

        Ok(())
    }

    pub fn env_dim(&self) -> i32 {
        self.env_dim
    }

    pub fn env_num_mips(&self) -> i32 {
        self.env_mip_offsets.len() as i32
    }

    pub fn instance_count(&self) -> usize {
        self.mesh_offsets.len()
    }

    pub(crate) fn meshes(&self) -> MeshesView<'_> {
        MeshesView {
            offsets: BufferView::new(
                &self.mesh_offsets,
                BufferId::InstanceIdToMeshDataOffsets,
            ),
            inv_transposed: BufferView::new(
                &self.inv_transposed,
                BufferId::InstanceIdToInvTransposedMatrices,
            ),
            uvs: BufferView::new(&self.uvs, BufferId::GeometryUv1s),
            positions: BufferView::new(
                &self.positions,
                BufferId::GeometryPositions,
            ),
            normals: BufferView::new(&self.normals, BufferId::GeometryNormals),
            indices: BufferView::new(&self.indices, BufferId::GeometryIndices),
        }
    }

    pub(crate) fn materials(&self) -> MaterialsView<'_> {
        MaterialsView {
            albedo_props: BufferView::new(
                &self.albedo_props,
                BufferId::InstanceIdToAlbedoTextureProperties,
            ),
            emissive_props: BufferView::new(
                &self.emissive_props,
                BufferId::InstanceIdToEmissiveTextureProperties,
            ),
            albedo: TextureAtlas::new(BufferView::new(
                &self.albedo_texels,
                BufferId::AlbedoTextures,
            )),
            emission: TextureAtlas::new(BufferView::new(
                &self.emissive_texels,
                BufferId::EmissiveTextures,
            )),
        }
    }

    pub(crate) fn lighting(&self) -> LightingView<'_> {
        LightingView {
            lights: BufferView::new(&self.lights, BufferId::Lights),
            falloffs: FalloffTables {
                distance: BufferView::new(
                    &self.distance_falloffs,
                    BufferId::DistanceFalloffs,
                ),
                angular: BufferView::new(
                    &self.angular_falloffs,
                    BufferId::AngularFalloffLut,
                ),
            },
        }
    }

    pub(crate) fn environment(&self) -> EnvironmentMap<'_> {
        EnvironmentMap {
            texels: BufferView::new(
                &self.env_texels,
                BufferId::EnvMippedCubeTexels,
            ),
            mip_offsets: BufferView::new(
                &self.env_mip_offsets,
                BufferId::EnvMipOffsets,
            ),
            dim: self.env_dim,
            num_mips: self.env_num_mips(),
        }
    }

    /// Returns capacities of the scene's buffers; per-dispatch buffers are
    /// left at zero.
    pub fn capacities(&self) -> BufferCapacities {
        BufferCapacities::default()
            .with(BufferId::Lights, self.lights.len())
            .with(BufferId::DistanceFalloffs, self.distance_falloffs.len())
            .with(BufferId::AngularFalloffLut, self.angular_falloffs.len())
            .with(BufferId::AlbedoTextures, self.albedo_texels.len())
            .with(BufferId::EmissiveTextures, self.emissive_texels.len())
            .with(
                BufferId::InstanceIdToAlbedoTextureProperties,
                self.albedo_props.len(),
            )
            .with(
                BufferId::InstanceIdToEmissiveTextureProperties,
                self.emissive_props.len(),
            )
            .with(
                BufferId::InstanceIdToMeshDataOffsets,
                self.mesh_offsets.len(),
            )
            .with(
                BufferId::InstanceIdToInvTransposedMatrices,
                self.inv_transposed.len(),
            )
            .with(BufferId::GeometryUv1s, self.uvs.len())
            .with(BufferId::GeometryPositions, self.positions.len())
            .with(BufferId::GeometryNormals, self.normals.len())
            .with(BufferId::GeometryIndices, self.indices.len())
            .with(BufferId::EnvMippedCubeTexels, self.env_texels.len())
            .with(BufferId::EnvMipOffsets, self.env_mip_offsets.len())
    }
}

fn add_texture<T>(
    atlas: &mut Vec<T>,
    width: u32,
    height: u32,
    texels: &[T],
) -> Result<MaterialTextureProperties, BakeError>
where
    T: Copy,
{
    BakeError::ensure_len(
        "texels",
        (width as usize) * (height as usize),
        texels.len(),
    )?;

    let props = MaterialTextureProperties::new(
        atlas.len() as i32,
        width as i32,
        height as i32,
    );

    atlas.extend_from_slice(texels);

    Ok(props)
}
