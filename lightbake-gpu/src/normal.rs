use bytemuck::{Pod, Zeroable};
use glam::{vec2, vec3, Vec2, Vec2Swizzles, Vec3, Vec3Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, U32Ext, Vec2Ext};

/// Unit vector compressed into three bytes (plus one byte of padding).
///
/// The vector is octahedron-mapped into `[0, 1]^2`, then each coordinate is
/// quantized into 12 bits: bytes `x` and `y` keep the low 8 bits of each
/// coordinate, byte `z` keeps the high 4 bits of both (x in the low nibble).
///
/// Bytes are stored little-endian inside a single `u32`, so the layout matches
/// a `{ x: u8, y: u8, z: u8, padding: u8 }` struct without requiring 8-bit
/// storage access on the device.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PackedNormal(u32);

impl PackedNormal {
    pub fn from_bytes(x: u32, y: u32, z: u32) -> Self {
        Self(u32::from_bytes([x & 0xff, y & 0xff, z & 0xff, 0]))
    }

    pub fn to_bytes(self) -> [u32; 3] {
        let [x, y, z, _] = self.0.to_bytes();

        [x, y, z]
    }

    pub fn encode(n: Vec3) -> Self {
        let n = oct_encode(n) * 0.5 + 0.5;

        Self::pack_unit_float2(vec2(n.x.saturate(), n.y.saturate()))
    }

    /// See: [`Self::encode()`].
    pub fn decode(self) -> Vec3 {
        oct_decode(self.unpack_unit_float2() * 2.0 - 1.0)
    }

    /// Quantizes two `[0, 1]` floats into 12 bits each, rounding to the
    /// nearest step.
    pub fn pack_unit_float2(f: Vec2) -> Self {
        let scaled = f * 4095.0 + 0.5;
        let ix = scaled.x as u32;
        let iy = scaled.y as u32;

        Self::from_bytes(ix & 255, iy & 255, (ix >> 8) | ((iy >> 8) << 4))
    }

    /// See: [`Self::pack_unit_float2()`].
    pub fn unpack_unit_float2(self) -> Vec2 {
        let [x, y, z] = self.to_bytes();
        let x = x | ((z & 15) << 8);
        let y = y | ((z >> 4) << 8);

        vec2(x as f32, y as f32) / 4095.0
    }
}

/// Projects a unit vector onto an octahedron and unfolds it into
/// `[-1, 1]^2`; the lower hemisphere is reflected over the diagonals.
pub fn oct_encode(v: Vec3) -> Vec2 {
    let p = v.xy() / (v.x.abs() + v.y.abs() + v.z.abs());

    if v.z <= 0.0 {
        (1.0 - p.yx().abs()) * p.sign_not_zero()
    } else {
        p
    }
}

/// See: [`oct_encode()`].
pub fn oct_decode(e: Vec2) -> Vec3 {
    let mut v = vec3(e.x, e.y, 1.0 - e.x.abs() - e.y.abs());

    if v.z < 0.0 {
        let xy = (1.0 - v.yx().abs()) * v.xy().sign_not_zero();

        v.x = xy.x;
        v.y = xy.y;
    }

    v.normalize()
}
