use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

use crate::{
    BufferView, GammaTexel, Intersection, LinearTexel,
    MaterialTextureProperties, MeshesView, TextureAtlas, Validate,
};

/// Texture sample taken at a ray hit.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct AtlasInfo {
    pub color: Vec4,
    pub uv: Vec2,
}

/// Read-only view over the scene's materials.
#[derive(Clone, Copy)]
pub struct MaterialsView<'a> {
    pub albedo_props: BufferView<'a, MaterialTextureProperties>,
    pub emissive_props: BufferView<'a, MaterialTextureProperties>,
    pub albedo: TextureAtlas<'a, GammaTexel>,
    pub emission: TextureAtlas<'a, LinearTexel>,
}

impl MaterialsView<'_> {
    pub fn fetch_albedo(
        &self,
        v: &mut impl Validate,
        meshes: &MeshesView,
        hit: Intersection,
    ) -> AtlasInfo {
        let props = self.albedo_props.get(v, hit.instance_id());
        let uv = meshes.uvs_at_intersection(v, hit);

        AtlasInfo {
            color: self.albedo.fetch(v, props, uv, true),
            uv,
        }
    }

    pub fn fetch_emission(
        &self,
        v: &mut impl Validate,
        meshes: &MeshesView,
        hit: Intersection,
    ) -> AtlasInfo {
        let props = self.emissive_props.get(v, hit.instance_id());
        let uv = meshes.uvs_at_intersection(v, hit);

        AtlasInfo {
            color: self.emission.fetch(v, props, uv, true),
            uv,
        }
    }
}

/// Surface found at the end of a path ray.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct HitSurface {
    pub albedo: Vec4,
    pub emission: Vec4,

    /// xyz - geometric normal
    /// w - unused
    pub plane_normal: Vec4,

    /// xyz - interpolated vertex normal
    /// w - unused
    pub interpolated_normal: Vec4,

    pub uv: Vec2,

    /// `-1` when the ray didn't hit anything
    pub instance_id: i32,

    pub distance: f32,
}

impl HitSurface {
    pub fn miss() -> Self {
        Self {
            instance_id: -1,
            ..Default::default()
        }
    }

    pub fn is_hit(&self) -> bool {
        self.instance_id >= 0
    }
}

/// Fetches everything the integrator needs to know about the surface hit by
/// a path ray.
pub fn resolve_hit(
    v: &mut impl Validate,
    meshes: &MeshesView,
    materials: &MaterialsView,
    hit: Intersection,
) -> HitSurface {
    if !hit.is_hit() {
        return HitSurface::miss();
    }

    let albedo = materials.fetch_albedo(v, meshes, hit);
    let emission = materials.fetch_emission(v, meshes, hit);
    let normals = meshes.normals_at_intersection(v, hit);

    HitSurface {
        albedo: albedo.color,
        emission: emission.color,
        plane_normal: normals.plane.extend(0.0),
        interpolated_normal: normals.interpolated.extend(0.0),
        uv: albedo.uv,
        instance_id: hit.instance_id(),
        distance: hit.distance(),
    }
}
