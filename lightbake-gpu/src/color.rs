//! sRGB transfer functions.
//!
//! The piecewise sRGB curve is only defined on `[0, 1)`; values above one
//! follow a plain 2.2 gamma instead.

use glam::{vec4, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub fn gamma_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else if value < 1.0 {
        ((value + 0.055) / 1.055).powf(2.4)
    } else if value == 1.0 {
        1.0
    } else {
        value.powf(2.2)
    }
}

/// Converts RGB from gamma into linear space; alpha is left as-is.
pub fn gamma_to_linear_rgb(color: Vec4) -> Vec4 {
    vec4(
        gamma_to_linear(color.x),
        gamma_to_linear(color.y),
        gamma_to_linear(color.z),
        color.w,
    )
}
