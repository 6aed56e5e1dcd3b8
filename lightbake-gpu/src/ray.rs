use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

/// Ray handed over to the (external) intersection engine.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Ray {
    /// xyz - origin
    /// w - max distance
    pub origin: Vec4,

    /// xyz - direction
    /// w - attenuation (n·l, times solid angle for rectangle lights)
    pub direction: Vec4,

    pub mask: u32,

    /// `0` for inactive rays, `u32::MAX` for active ones
    pub active: u32,

    pub backface_culling: u32,

    /// Index of the texel this ray originates from
    pub texel_idx: i32,
}

impl Ray {
    pub const MASK_ALL: u32 = u32::MAX;

    pub fn new(
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        attenuation: f32,
        mask: u32,
    ) -> Self {
        Self {
            origin: origin.extend(max_distance),
            direction: direction.extend(attenuation),
            mask,
            active: u32::MAX,
            backface_culling: 0,
            texel_idx: 0,
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn with_texel_idx(mut self, texel_idx: i32) -> Self {
        self.texel_idx = texel_idx;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active != 0
    }

    pub fn set_inactive(&mut self) {
        self.active = 0;
    }

    pub fn origin(&self) -> Vec3 {
        self.origin.xyz()
    }

    pub fn max_distance(&self) -> f32 {
        self.origin.w
    }

    pub fn direction(&self) -> Vec3 {
        self.direction.xyz()
    }

    pub fn attenuation(&self) -> f32 {
        self.direction.w
    }
}
