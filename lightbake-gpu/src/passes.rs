use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{
    is_occupied_position, EnvironmentLightingInputData, ShadowRayOptions,
    ShadowRaySurface,
};

/// What kind of sample a kernel is evaluating.
#[repr(u32)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum SurfaceMode {
    /// Lightmap texel lying on a surface
    #[default]
    Texel = 0,

    /// Light probe floating in space; it has no meaningful normal, so rays
    /// are neither pushed off nor tested against it
    Probe = 1,
}

impl SurfaceMode {
    pub fn from_raw(mode: u32) -> Self {
        if mode == SurfaceMode::Probe as u32 {
            SurfaceMode::Probe
        } else {
            SurfaceMode::Texel
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PrepareShadowRaysPassParams {
    pub count: u32,
    pub surface_mode: u32,
    pub force_hard_shadow: u32,
    pub push_off: f32,
}

impl PrepareShadowRaysPassParams {
    pub fn opts(&self) -> ShadowRayOptions {
        ShadowRayOptions {
            push_off: self.push_off,
            force_hard_shadow: self.force_hard_shadow != 0,
            surface_mode: SurfaceMode::from_raw(self.surface_mode),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadeDirectPassParams {
    pub count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ResolveHitsPassParams {
    pub count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct FinalGatherPassParams {
    pub env: EnvironmentLightingInputData,
    pub count: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct AccumulateProbeShPassParams {
    pub count: u32,
    pub probe_count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct EncodeRgbmPassParams {
    pub count: u32,

    /// Width of the destination image; texel `i` lands at
    /// `(i % width, i / width)`
    pub width: u32,

    pub max_range: f32,
    pub threshold: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ConvergencePassParams {
    pub count: u32,

    /// Sample counts at which a texel's direct and GI estimates are
    /// considered converged
    pub max_direct_samples: i32,
    pub max_gi_samples: i32,

    pub _pad0: u32,
}

/// Input of a single shadow ray.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadowRayRequest {
    /// xyz - sample position
    /// w - `-1` if the position is not occupied, `0` otherwise
    pub position: Vec4,

    /// xyz - surface normal (zero for probes)
    /// w - unused
    pub normal: Vec4,

    /// xy - random sample in `[0, 1]`
    /// z - (as u32) light index
    /// w - (as i32) texel index
    pub sample: Vec4,
}

impl ShadowRayRequest {
    pub fn new(
        position: Vec3,
        normal: Vec3,
        sample: Vec2,
        light_idx: u32,
        texel_idx: i32,
    ) -> Self {
        Self {
            position: position.extend(0.0),
            normal: normal.extend(0.0),
            sample: sample
                .extend(f32::from_bits(light_idx))
                .extend(f32::from_bits(texel_idx as u32)),
        }
    }

    pub fn is_occupied(&self) -> bool {
        is_occupied_position(self.position)
    }

    pub fn light_idx(&self) -> u32 {
        self.sample.z.to_bits()
    }

    pub fn texel_idx(&self) -> i32 {
        self.sample.w.to_bits() as i32
    }

    pub fn sample(&self) -> Vec2 {
        self.sample.xy()
    }

    pub fn surface(&self) -> ShadowRaySurface {
        ShadowRaySurface {
            position: self.position.xyz(),
            normal: self.normal.xyz(),
            texel_idx: self.texel_idx(),
        }
    }
}

/// Input of a single final-gather lookup.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GatherRequest {
    /// xyz - gather direction
    /// w - `1` if the gather ray escaped the scene, `0` if it hit something
    pub direction: Vec4,

    /// xyz - normal of the surface the ray was shot from
    /// w - unused
    pub normal: Vec4,
}

impl GatherRequest {
    pub fn new(direction: Vec3, normal: Vec3, escaped: bool) -> Self {
        Self {
            direction: direction.extend(if escaped { 1.0 } else { 0.0 }),
            normal: normal.extend(0.0),
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction.xyz()
    }

    pub fn normal(&self) -> Vec3 {
        self.normal.xyz()
    }

    pub fn escaped(&self) -> bool {
        self.direction.w > 0.5
    }
}

/// Radiance sample to be projected onto a probe's SH coefficients.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ProbeSample {
    /// xyz - radiance
    /// w - weight
    pub color: Vec4,

    /// xyz - direction the radiance arrives from
    /// w - (as i32) probe index
    pub direction: Vec4,
}

impl ProbeSample {
    pub fn new(
        color: Vec3,
        direction: Vec3,
        weight: f32,
        probe_id: i32,
    ) -> Self {
        Self {
            color: color.extend(weight),
            direction: direction.extend(f32::from_bits(probe_id as u32)),
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color.xyz()
    }

    pub fn weight(&self) -> f32 {
        self.color.w
    }

    pub fn direction(&self) -> Vec3 {
        self.direction.xyz()
    }

    pub fn probe_id(&self) -> i32 {
        self.direction.w.to_bits() as i32
    }
}
