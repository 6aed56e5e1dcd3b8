use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{BufferView, PackedNormal, Validate};

/// Hit record produced by the (external) ray-intersection engine.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Intersection {
    /// Id of the hit shape; `0` stands for "no hit", otherwise the instance
    /// id is `shape_id - 1`
    pub shape_id: i32,

    /// Index of the hit triangle within its mesh
    pub prim_id: i32,

    pub _pad0: i32,
    pub _pad1: i32,

    /// xy - barycentric coordinates
    /// z - unused
    /// w - hit distance
    pub uvwt: Vec4,
}

impl Intersection {
    pub fn is_hit(&self) -> bool {
        self.shape_id > 0
    }

    pub fn instance_id(&self) -> i32 {
        self.shape_id - 1
    }

    pub fn barycentrics(&self) -> Vec2 {
        self.uvwt.xy()
    }

    pub fn distance(&self) -> f32 {
        self.uvwt.w
    }
}

/// Per-instance offsets into the shared vertex and index buffers.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct MeshDataOffsets {
    pub vertex_offset: i32,
    pub index_offset: i32,
}

/// Row-major 4x4 matrix.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Matrix4x4 {
    pub m0: Vec4,
    pub m1: Vec4,
    pub m2: Vec4,
    pub m3: Vec4,
}

impl Matrix4x4 {
    pub const IDENTITY: Self = Self {
        m0: Vec4::X,
        m1: Vec4::Y,
        m2: Vec4::Z,
        m3: Vec4::W,
    };

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.m0.xyz().dot(v),
            self.m1.xyz().dot(v),
            self.m2.xyz().dot(v),
        )
    }
}

/// Normals of a surface at a ray hit, in world space.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct HitNormals {
    /// Geometric normal of the hit triangle
    pub plane: Vec3,

    /// Vertex normal interpolated at the hit point
    pub interpolated: Vec3,
}

/// Read-only view over the scene's meshes.
///
/// Vertex positions are stored as `Vec4`s (with `w` ignored) so that the
/// buffer has the same stride on both sides.
#[derive(Clone, Copy)]
pub struct MeshesView<'a> {
    pub offsets: BufferView<'a, MeshDataOffsets>,
    pub inv_transposed: BufferView<'a, Matrix4x4>,
    pub uvs: BufferView<'a, Vec2>,
    pub positions: BufferView<'a, Vec4>,
    pub normals: BufferView<'a, PackedNormal>,
    pub indices: BufferView<'a, u32>,
}

impl MeshesView<'_> {
    /// Returns the (global) vertex indices of given triangle.
    pub fn triangle(
        &self,
        v: &mut impl Validate,
        instance_id: i32,
        prim_id: i32,
    ) -> [i32; 3] {
        let offsets = self.offsets.get(v, instance_id);
        let idx0 = offsets.index_offset + prim_id * 3;

        [
            offsets.vertex_offset + self.indices.get(v, idx0) as i32,
            offsets.vertex_offset + self.indices.get(v, idx0 + 1) as i32,
            offsets.vertex_offset + self.indices.get(v, idx0 + 2) as i32,
        ]
    }

    /// Interpolates lightmap UVs of given triangle at barycentric coordinates
    /// `(u, v)`, where `u` weights the second vertex and `v` the third one.
    pub fn uvs_at(
        &self,
        v: &mut impl Validate,
        instance_id: i32,
        prim_id: i32,
        barycentrics: Vec2,
    ) -> Vec2 {
        let [i0, i1, i2] = self.triangle(v, instance_id, prim_id);
        let w1 = barycentrics.x;
        let w2 = barycentrics.y;
        let w0 = 1.0 - w1 - w2;

        w0 * self.uvs.get(v, i0)
            + w1 * self.uvs.get(v, i1)
            + w2 * self.uvs.get(v, i2)
    }

    pub fn uvs_at_intersection(
        &self,
        v: &mut impl Validate,
        hit: Intersection,
    ) -> Vec2 {
        self.uvs_at(v, hit.instance_id(), hit.prim_id, hit.barycentrics())
    }

    /// Returns world-space normals at the hit point.
    ///
    /// When the interpolated vertex normal faces away from the triangle's
    /// plane normal (or is NaN), the plane normal is used in its place.
    pub fn normals_at_intersection(
        &self,
        v: &mut impl Validate,
        hit: Intersection,
    ) -> HitNormals {
        let instance_id = hit.instance_id();
        let [i0, i1, i2] = self.triangle(v, instance_id, hit.prim_id);

        let p0 = self.positions.get(v, i0).xyz();
        let p1 = self.positions.get(v, i1).xyz();
        let p2 = self.positions.get(v, i2).xyz();
        let plane = (p1 - p0).cross(p2 - p0);

        let n0 = self.normals.get(v, i0).decode();
        let n1 = self.normals.get(v, i1).decode();
        let n2 = self.normals.get(v, i2).decode();

        // Weights are `(v, u)` here, as opposed to `(u, v)` in `uvs_at()`
        let w1 = hit.uvwt.y;
        let w2 = hit.uvwt.x;
        let w0 = 1.0 - w1 - w2;
        let interpolated = w0 * n0 + w1 * n1 + w2 * n2;
        let facing = interpolated.dot(plane);

        let interpolated = if facing <= 0.0 || facing.is_nan() {
            plane
        } else {
            interpolated
        };

        let xform = self.inv_transposed.get(v, instance_id);

        HitNormals {
            plane: xform.transform_vector(plane).normalize(),
            interpolated: xform.transform_vector(interpolated).normalize(),
        }
    }
}

/// Returns whether given sample position is occupied; unoccupied positions
/// are marked with `w = -1`.
pub fn is_occupied_position(position: Vec4) -> bool {
    position.w >= -0.5
}

pub fn assert_position_is_occupied(v: &mut impl Validate, position: Vec4) {
    v.assert(is_occupied_position(position), line!());
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use glam::{vec2, vec3, vec4};

    use super::*;
    use crate::{BufferId, Checked, FaultReason, KernelFault, Unchecked};

    struct Fixture {
        offsets: Vec<MeshDataOffsets>,
        inv_transposed: Vec<Matrix4x4>,
        uvs: Vec<Vec2>,
        positions: Vec<Vec4>,
        normals: Vec<PackedNormal>,
        indices: Vec<u32>,
    }

    impl Fixture {
        /// Two instances: a dummy one and a quad in the XY plane, facing +Z,
        /// whose triangles are stored after two unrelated vertices.
        fn new(vertex_normal: Vec3) -> Self {
            let positions = vec![
                Vec4::ZERO,
                Vec4::ZERO,
                vec4(0.0, 0.0, 0.0, 1.0),
                vec4(1.0, 0.0, 0.0, 1.0),
                vec4(0.0, 1.0, 0.0, 1.0),
                vec4(1.0, 1.0, 0.0, 1.0),
            ];

            let uvs = vec![
                Vec2::ZERO,
                Vec2::ZERO,
                vec2(0.0, 0.0),
                vec2(1.0, 0.0),
                vec2(0.0, 1.0),
                vec2(1.0, 1.0),
            ];

            Self {
                offsets: vec![
                    MeshDataOffsets::default(),
                    MeshDataOffsets {
                        vertex_offset: 2,
                        index_offset: 3,
                    },
                ],
                inv_transposed: vec![Matrix4x4::IDENTITY; 2],
                uvs,
                positions,
                normals: vec![PackedNormal::encode(vertex_normal); 6],
                indices: vec![0, 0, 0, 0, 1, 2, 1, 3, 2],
            }
        }

        fn view(&self) -> MeshesView<'_> {
            MeshesView {
                offsets: BufferView::new(
                    &self.offsets,
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
                normals: BufferView::new(
                    &self.normals,
                    BufferId::GeometryNormals,
                ),
                indices: BufferView::new(
                    &self.indices,
                    BufferId::GeometryIndices,
                ),
            }
        }
    }

    fn hit(prim_id: i32, u: f32, v: f32) -> Intersection {
        Intersection {
            shape_id: 2,
            prim_id,
            uvwt: vec4(u, v, 0.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn uvs_are_interpolated_barycentrically() {
        let fixture = Fixture::new(Vec3::Z);
        let meshes = fixture.view();

        let uv =
            meshes.uvs_at_intersection(&mut Unchecked, hit(0, 0.5, 0.25));

        assert_abs_diff_eq!(0.5, uv.x);
        assert_abs_diff_eq!(0.25, uv.y);

        let uv =
            meshes.uvs_at_intersection(&mut Unchecked, hit(1, 0.0, 0.0));

        assert_abs_diff_eq!(1.0, uv.x);
        assert_abs_diff_eq!(0.0, uv.y);
    }

    #[test]
    fn facing_vertex_normals_are_kept() {
        let normal = vec3(0.3, 0.0, 1.0).normalize();
        let fixture = Fixture::new(normal);

        let normals = fixture
            .view()
            .normals_at_intersection(&mut Unchecked, hit(0, 0.2, 0.3));

        assert_abs_diff_eq!(0.0, normals.plane.x);
        assert_abs_diff_eq!(1.0, normals.plane.z);
        assert_abs_diff_eq!(normal.x, normals.interpolated.x, epsilon = 1e-3);
        assert_abs_diff_eq!(normal.z, normals.interpolated.z, epsilon = 1e-3);
    }

    #[test]
    fn back_facing_vertex_normals_fall_back_to_plane_normal() {
        let fixture = Fixture::new(-Vec3::Z);

        let normals = fixture
            .view()
            .normals_at_intersection(&mut Unchecked, hit(0, 0.2, 0.3));

        assert_abs_diff_eq!(1.0, normals.interpolated.z);
    }

    #[test]
    fn normals_are_transformed_into_world_space() {
        let mut fixture = Fixture::new(Vec3::Z);

        // Swaps Y and Z
        fixture.inv_transposed[1] = Matrix4x4 {
            m0: Vec4::X,
            m1: Vec4::Z,
            m2: Vec4::Y,
            m3: Vec4::W,
        };

        let normals = fixture
            .view()
            .normals_at_intersection(&mut Unchecked, hit(0, 0.2, 0.3));

        assert_abs_diff_eq!(1.0, normals.plane.y);
        assert_abs_diff_eq!(1.0, normals.interpolated.y, epsilon = 1e-3);
    }

    #[test]
    fn unoccupied_positions_trip_the_assertion() {
        let mut fault = KernelFault::default();
        let mut v = Checked::new(&[], &mut fault);

        assert_position_is_occupied(&mut v, vec4(1.0, 2.0, 3.0, 0.0));
        assert_position_is_occupied(&mut v, vec4(1.0, 2.0, 3.0, -1.0));

        assert_eq!(1, fault.claims);
        assert_eq!(FaultReason::AssertionFailed, fault.reason());
    }
}
