mod falloff;
mod shading;
mod shadow_ray;

use bytemuck::{Pod, Zeroable};
use glam::{vec4, Vec3, Vec4, Vec4Swizzles};

pub use self::falloff::*;
pub use self::shading::*;
pub use self::shadow_ray::*;
use crate::BufferView;

/// Light as laid out in device memory (128 bytes).
///
/// The last four vectors are a payload whose meaning depends on
/// `light_type`; see [`LightKind`] for the decoded form.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct LightBuffer {
    /// xyz - position
    /// w - shadow radius (used to jitter shadow rays of punctual lights)
    pub pos: Vec4,

    /// xyz - color
    /// w - intensity
    pub col: Vec4,

    /// xyz - direction
    /// w - range
    pub dir: Vec4,

    pub light_type: u32,
    pub direct_bake_mode: i32,
    pub probe_occlusion_light_index: i32,
    pub cast_shadow: u32,

    /// Spot:
    /// - d0.x - (as u32) falloff index
    /// - d0.y - cosine of the cone angle
    /// - d0.z - inverse cosine of the cone angle
    /// - d0.w - cotangent of the cone angle
    ///
    /// Point:
    /// - d0.x - (as u32) falloff index
    ///
    /// Rectangle:
    /// - d0.x - height
    /// - d0.y - width
    /// - d1.xyz - normal
    /// - d2.xyz - tangent
    /// - d3.xyz - bitangent
    ///
    /// Disc:
    /// - d0.x - radius
    /// - d1.xyz - normal
    /// - d2.xyz - tangent
    pub data: [Vec4; 4],
}

impl LightBuffer {
    pub const TYPE_SPOT: u32 = 0;
    pub const TYPE_DIRECTIONAL: u32 = 1;
    pub const TYPE_POINT: u32 = 2;
    pub const TYPE_RECTANGLE: u32 = 3;
    pub const TYPE_DISC: u32 = 4;

    pub fn kind(&self) -> Option<LightKind> {
        let [d0, d1, d2, d3] = self.data;

        match self.light_type {
            Self::TYPE_SPOT => Some(LightKind::Spot {
                falloff_index: d0.x.to_bits(),
                cos_cone_angle: d0.y,
                inv_cos_cone_angle: d0.z,
                cotan_cone_angle: d0.w,
            }),

            Self::TYPE_DIRECTIONAL => Some(LightKind::Directional),

            Self::TYPE_POINT => Some(LightKind::Point {
                falloff_index: d0.x.to_bits(),
            }),

            Self::TYPE_RECTANGLE => Some(LightKind::Rectangle {
                width: d0.y,
                height: d0.x,
                normal: d1.xyz(),
                tangent: d2.xyz(),
                bitangent: d3.xyz(),
            }),

            Self::TYPE_DISC => Some(LightKind::Disc {
                radius: d0.x,
                normal: d1.xyz(),
                tangent: d2.xyz(),
            }),

            _ => None,
        }
    }

    /// Decodes this light; returns `None` for unknown light types.
    pub fn decode(&self) -> Option<Light> {
        let kind = self.kind()?;

        Some(Light {
            position: self.pos.xyz(),
            shadow_radius: self.pos.w,
            color: self.col.xyz(),
            intensity: self.col.w,
            direction: self.dir.xyz(),
            range: self.dir.w,
            direct_bake_mode: self.direct_bake_mode,
            probe_occlusion_light_index: self.probe_occlusion_light_index,
            cast_shadow: self.cast_shadow != 0,
            kind,
        })
    }
}

/// Light in its decoded form.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Light {
    pub position: Vec3,
    pub shadow_radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
    pub range: f32,
    pub direct_bake_mode: i32,
    pub probe_occlusion_light_index: i32,
    pub cast_shadow: bool,
    pub kind: LightKind,
}

impl Light {
    pub fn encode(&self) -> LightBuffer {
        let (light_type, data) = match self.kind {
            LightKind::Spot {
                falloff_index,
                cos_cone_angle,
                inv_cos_cone_angle,
                cotan_cone_angle,
            } => (
                LightBuffer::TYPE_SPOT,
                [
                    vec4(
                        f32::from_bits(falloff_index),
                        cos_cone_angle,
                        inv_cos_cone_angle,
                        cotan_cone_angle,
                    ),
                    Vec4::ZERO,
                    Vec4::ZERO,
                    Vec4::ZERO,
                ],
            ),

            LightKind::Directional => {
                (LightBuffer::TYPE_DIRECTIONAL, [Vec4::ZERO; 4])
            }

            LightKind::Point { falloff_index } => (
                LightBuffer::TYPE_POINT,
                [
                    vec4(f32::from_bits(falloff_index), 0.0, 0.0, 0.0),
                    Vec4::ZERO,
                    Vec4::ZERO,
                    Vec4::ZERO,
                ],
            ),

            LightKind::Rectangle {
                width,
                height,
                normal,
                tangent,
                bitangent,
            } => (
                LightBuffer::TYPE_RECTANGLE,
                [
                    vec4(height, width, 0.0, 0.0),
                    normal.extend(0.0),
                    tangent.extend(0.0),
                    bitangent.extend(0.0),
                ],
            ),

            LightKind::Disc {
                radius,
                normal,
                tangent,
            } => (
                LightBuffer::TYPE_DISC,
                [
                    vec4(radius, 0.0, 0.0, 0.0),
                    normal.extend(0.0),
                    tangent.extend(0.0),
                    Vec4::ZERO,
                ],
            ),
        };

        LightBuffer {
            pos: self.position.extend(self.shadow_radius),
            col: self.color.extend(self.intensity),
            dir: self.direction.extend(self.range),
            light_type,
            direct_bake_mode: self.direct_bake_mode,
            probe_occlusion_light_index: self.probe_occlusion_light_index,
            cast_shadow: self.cast_shadow as u32,
            data,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum LightKind {
    Spot {
        falloff_index: u32,
        cos_cone_angle: f32,
        inv_cos_cone_angle: f32,
        cotan_cone_angle: f32,
    },

    /// Infinitely far away light shining along [`Light::direction`]; has no
    /// range.
    Directional,

    Point {
        falloff_index: u32,
    },

    Rectangle {
        width: f32,
        height: f32,
        normal: Vec3,
        tangent: Vec3,
        bitangent: Vec3,
    },

    Disc {
        radius: f32,
        normal: Vec3,
        tangent: Vec3,
    },
}

/// Everything needed to evaluate direct lighting.
#[derive(Clone, Copy)]
pub struct LightingView<'a> {
    pub lights: BufferView<'a, LightBuffer>,
    pub falloffs: FalloffTables<'a>,
}
