use glam::{Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

const GAMMA: f32 = 2.2;

/// Encodes a linear HDR color as RGBM: `rgb * (max_range * a)^2.2`, where
/// `a` is stored in the alpha channel and is a multiple of `1/255`.
///
/// `threshold` is the smallest multiplier source used for dark colors.
pub fn rgbm_encode(color: Vec3, max_range: f32, threshold: f32) -> Vec4 {
    let color = color.max(Vec3::ZERO).min(Vec3::splat(max_range));
    let m = color.max_element().max(threshold);

    // Rounding up keeps `(max_range * a)^2.2 >= m`, so the decoded color is
    // never dimmer than the source
    let a = (255.0 * (1.0 / max_range) * m.powf(1.0 / GAMMA)).ceil() / 255.0;
    let k = (max_range * a).powf(GAMMA);

    (color / k).max(Vec3::ZERO).min(Vec3::ONE).extend(a)
}

pub fn rgbm_decode(rgbm: Vec4, max_range: f32) -> Vec3 {
    rgbm.truncate() * (max_range * rgbm.w).powf(GAMMA)
}
