use core::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{vec2, Vec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{BufferView, Validate, FLT_EPSILON};

/// Parameters of environment lighting, shared by all work-items.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct EnvironmentLightingInputData {
    /// Size of the cube map's largest face, in texels (excluding border)
    pub env_dim: i32,

    pub num_mips: i32,

    /// Added to the level of detail computed in [`final_gather_lod()`]
    pub mip_offset_bias: f32,

    pub _pad0: u32,
}

#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

/// Returns the cube face `dir` points at, together with face-local
/// coordinates in `[0, 1]`.
pub fn cube_face_coords(dir: Vec3) -> (CubeFace, Vec2) {
    let abs = dir.abs();

    let (face, s, t, major) = if abs.z >= abs.x && abs.z >= abs.y {
        if dir.z >= 0.0 {
            (CubeFace::PosZ, dir.x, dir.y, dir.z)
        } else {
            (CubeFace::NegZ, -dir.x, dir.y, dir.z)
        }
    } else if abs.y > abs.x {
        if dir.y >= 0.0 {
            (CubeFace::PosY, dir.x, -dir.z, dir.y)
        } else {
            (CubeFace::NegY, dir.x, dir.z, dir.y)
        }
    } else if dir.x >= 0.0 {
        (CubeFace::PosX, -dir.z, dir.y, dir.x)
    } else {
        (CubeFace::NegX, dir.z, dir.y, dir.x)
    };

    let denom = major.abs().max(FLT_EPSILON);
    let s = s / denom;
    let t = t / denom;

    (face, vec2(0.5 * s + 0.5, -0.5 * t + 0.5))
}

/// Returns index of texel `(x, y)` within a face of size `dim`, accounting for
/// the one-texel border around each face.
pub fn bordered_texel_index(x: i32, y: i32, dim: i32) -> i32 {
    (y + 1) * (dim + 2) + (x + 1)
}

/// Returns the offset at which each mip level starts, for a cube map whose
/// largest face is `dim` texels wide.
#[cfg(not(target_arch = "spirv"))]
pub fn environment_mip_offsets(dim: i32, num_mips: i32) -> Vec<i32> {
    let mut offset = 0;

    (0..num_mips)
        .map(|mip| {
            let mip_dim = dim >> mip;
            let mip_offset = offset;

            offset += 6 * (mip_dim + 2) * (mip_dim + 2);
            mip_offset
        })
        .collect()
}

/// Level of detail used for a final-gather lookup in direction `dir`, as seen
/// from a surface with given `normal`.
///
/// Directions more likely to be sampled (higher pdf) read from finer levels.
pub fn final_gather_lod(dir: Vec3, normal: Vec3, lod_bias: f32) -> f32 {
    let pdf = dir.dot(normal) / PI * 10.0;
    let max_abs = dir.abs().max_element();
    let density = pdf * max_abs * max_abs * max_abs;

    (lod_bias - 0.5 * density.max(FLT_EPSILON).log2()).max(0.0)
}

/// Pre-filtered, mip-mapped cube map.
///
/// Each mip level stores its six faces back to back (in [`CubeFace`] order),
/// each face surrounded by a one-texel border so that bilinear taps never
/// have to cross faces.
#[derive(Clone, Copy)]
pub struct EnvironmentMap<'a> {
    pub texels: BufferView<'a, Vec4>,
    pub mip_offsets: BufferView<'a, i32>,
    pub dim: i32,
    pub num_mips: i32,
}

impl EnvironmentMap<'_> {
    pub fn sample(&self, v: &mut impl Validate, dir: Vec3, lod: f32) -> Vec4 {
        let (face, st) = cube_face_coords(dir);

        self.sample_trilinear(v, face, st, lod)
    }

    pub fn final_gather(
        &self,
        v: &mut impl Validate,
        dir: Vec3,
        normal: Vec3,
        lod_bias: f32,
    ) -> Vec4 {
        self.sample(v, dir, final_gather_lod(dir, normal, lod_bias))
    }

    pub fn sample_trilinear(
        &self,
        v: &mut impl Validate,
        face: CubeFace,
        st: Vec2,
        lod: f32,
    ) -> Vec4 {
        let st = st.max(Vec2::ZERO).min(Vec2::ONE);
        let max_lod = (self.num_mips - 1) as f32;

        let lod = if lod > max_lod {
            max_lod
        } else if lod < 0.0 {
            0.0
        } else {
            lod
        };

        let lod0 = lod as i32;
        let lod1 = (lod0 + 1).min(self.num_mips - 1);
        let mix = lod - lod0 as f32;

        let mip_offset0 = self.mip_offsets.get(v, lod0);
        let pix0 = self.sample_bilinear(
            v,
            mip_offset0,
            face,
            self.dim >> lod0,
            st,
        );

        let mip_offset1 = self.mip_offsets.get(v, lod1);
        let pix1 = self.sample_bilinear(
            v,
            mip_offset1,
            face,
            self.dim >> lod1,
            st,
        );

        (1.0 - mix) * pix0 + mix * pix1
    }

    /// Samples a single mip level; `st` must be within `[0, 1]`.
    pub fn sample_bilinear(
        &self,
        v: &mut impl Validate,
        mip_offset: i32,
        face: CubeFace,
        mip_dim: i32,
        st: Vec2,
    ) -> Vec4 {
        let uv = st * mip_dim as f32 - 0.5;
        let offset = mip_offset + (mip_dim + 2) * (mip_dim + 2) * face as i32;

        // Same as `floor()`, since `uv >= -0.5`
        let u0 = (uv.x + 1.0) as i32 - 1;
        let v0 = (uv.y + 1.0) as i32 - 1;

        let dx = uv.x - u0 as f32;
        let dy = uv.y - v0 as f32;

        let c00 = self.texel(v, offset, u0, v0, mip_dim);
        let c10 = self.texel(v, offset, u0 + 1, v0, mip_dim);
        let c01 = self.texel(v, offset, u0, v0 + 1, mip_dim);
        let c11 = self.texel(v, offset, u0 + 1, v0 + 1, mip_dim);

        c00 * ((1.0 - dx) * (1.0 - dy))
            + c10 * (dx * (1.0 - dy))
            + c01 * ((1.0 - dx) * dy)
            + c11 * (dx * dy)
    }

    #[track_caller]
    fn texel(
        &self,
        v: &mut impl Validate,
        face_offset: i32,
        x: i32,
        y: i32,
        mip_dim: i32,
    ) -> Vec4 {
        self.texels
            .get(v, face_offset + bordered_texel_index(x, y, mip_dim))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{BufferId, Checked, KernelFault, Unchecked};

    struct Fixture {
        capacities: [u32; BufferId::COUNT],
        texels: Vec<Vec4>,
        mip_offsets: Vec<i32>,
        dim: i32,
    }

    impl Fixture {
        /// Cube map whose every texel of `mip`-th level is `mip + 1`.
        fn new(dim: i32, num_mips: i32) -> Self {
            let mip_offsets = environment_mip_offsets(dim, num_mips);
            let mut texels = Vec::new();

            for mip in 0..num_mips {
                let mip_dim = dim >> mip;
                let len = 6 * (mip_dim + 2) * (mip_dim + 2);

                texels.extend(
                    (0..len).map(|_| Vec4::splat((mip + 1) as f32)),
                );
            }

            let mut capacities = [0; BufferId::COUNT];

            capacities[BufferId::EnvMippedCubeTexels as usize] =
                texels.len() as u32;

            capacities[BufferId::EnvMipOffsets as usize] =
                mip_offsets.len() as u32;

            Self {
                capacities,
                texels,
                mip_offsets,
                dim,
            }
        }

        fn map(&self) -> EnvironmentMap<'_> {
            EnvironmentMap {
                texels: BufferView::new(
                    &self.texels,
                    BufferId::EnvMippedCubeTexels,
                ),
                mip_offsets: BufferView::new(
                    &self.mip_offsets,
                    BufferId::EnvMipOffsets,
                ),
                dim: self.dim,
                num_mips: self.mip_offsets.len() as i32,
            }
        }
    }

    #[test]
    fn faces() {
        let cases = [
            (Vec3::X, CubeFace::PosX),
            (Vec3::NEG_X, CubeFace::NegX),
            (Vec3::Y, CubeFace::PosY),
            (Vec3::NEG_Y, CubeFace::NegY),
            (Vec3::Z, CubeFace::PosZ),
            (Vec3::NEG_Z, CubeFace::NegZ),
            // Ties are resolved towards Z, then X
            (vec3(1.0, 1.0, 1.0), CubeFace::PosZ),
            (vec3(1.0, -1.0, 0.0), CubeFace::PosX),
        ];

        for (dir, expected) in cases {
            let (face, st) = cube_face_coords(dir);

            assert_eq!(expected, face, "dir={:?}", dir);
            assert!(st.cmpge(Vec2::ZERO).all() && st.cmple(Vec2::ONE).all());
        }

        assert_eq!(vec2(0.5, 0.5), cube_face_coords(Vec3::X).1);
    }

    #[test]
    fn face_winding() {
        // +Z: `s` follows X, `t` follows -Y
        let (_, st) = cube_face_coords(vec3(0.5, 0.5, 1.0));

        assert_eq!(vec2(0.75, 0.25), st);

        // -Z: `s` follows -X
        let (_, st) = cube_face_coords(vec3(0.5, 0.5, -1.0));

        assert_eq!(vec2(0.25, 0.25), st);

        // +X: `s` follows -Z
        let (_, st) = cube_face_coords(vec3(1.0, 0.0, 0.5));

        assert_eq!(vec2(0.25, 0.5), st);

        // +Y: `t` follows Z
        let (_, st) = cube_face_coords(vec3(0.0, 1.0, 0.5));

        assert_eq!(vec2(0.5, 0.75), st);
    }

    #[test]
    fn mip_offsets() {
        assert_eq!(
            vec![0, 6 * 36, 6 * 36 + 6 * 16, 6 * 36 + 6 * 16 + 6 * 9],
            environment_mip_offsets(4, 4)
        );
    }

    #[test]
    fn texel_centers_are_not_blended() {
        let mut fixture = Fixture::new(2, 1);

        for texel in &mut fixture.texels {
            *texel = Vec4::ZERO;
        }

        let idx = (4 * 4) * CubeFace::PosZ as i32
            + bordered_texel_index(0, 0, 2);

        fixture.texels[idx as usize] = Vec4::splat(7.0);

        let color = fixture.map().sample(
            &mut Unchecked,
            vec3(-0.5, 0.5, 1.0),
            0.0,
        );

        assert_eq!(Vec4::splat(7.0), color);
    }

    #[test]
    fn lod_blends_adjacent_mips() {
        let fixture = Fixture::new(8, 3);
        let map = fixture.map();

        let sample = |lod| map.sample(&mut Unchecked, Vec3::Y, lod).x;

        assert_relative_eq!(1.0, sample(0.0));
        assert_relative_eq!(1.5, sample(0.5));
        assert_relative_eq!(2.0, sample(1.0));
        assert_relative_eq!(2.25, sample(1.25));
        assert_relative_eq!(3.0, sample(2.0));

        // Clamped to available levels
        assert_relative_eq!(1.0, sample(-4.0));
        assert_relative_eq!(3.0, sample(17.0));
    }

    #[test]
    fn random_directions_stay_within_the_map() {
        let mut rng = StdRng::seed_from_u64(1234);
        let fixture = Fixture::new(16, 5);
        let map = fixture.map();
        let mut fault = KernelFault::default();
        let mut v = Checked::new(&fixture.capacities, &mut fault);

        for _ in 0..1024 {
            let dir = vec3(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );

            let lod = rng.gen_range(-1.0..6.0);
            let color = map.sample(&mut v, dir, lod);

            assert!(color.x >= 1.0 - 1e-5 && color.x <= 5.0 + 1e-5);
        }

        assert!(!fault.is_some());
    }

    #[test]
    fn final_gather_prefers_finer_mips_for_likely_directions() {
        let along_normal = final_gather_lod(Vec3::Z, Vec3::Z, 2.0);
        let grazing = final_gather_lod(
            vec3(1.0, 0.0, 0.1).normalize(),
            Vec3::Z,
            2.0,
        );

        assert_relative_eq!(
            2.0 - 0.5 * (10.0 / PI).log2(),
            along_normal,
            epsilon = 1e-5
        );
        assert!(grazing > along_normal);

        // Directions below the surface read from the coarsest level
        assert_relative_eq!(
            2.0 - 0.5 * FLT_EPSILON.log2(),
            final_gather_lod(Vec3::NEG_Z, Vec3::Z, 2.0)
        );

        assert_eq!(0.0, final_gather_lod(Vec3::Z, Vec3::Z, -5.0));
    }
}
