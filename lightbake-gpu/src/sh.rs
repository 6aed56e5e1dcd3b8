use glam::{Vec3, Vec4};

use crate::{BufferViewMut, Validate};

/// Number of coefficients of second-order spherical harmonics.
pub const SH_COEFF_COUNT: usize = 9;

/// 1 / (2 * sqrt(π))
const K1_DIV_2_SQRT_PI: f32 = 0.282_094_8;

/// sqrt(3) / (2 * sqrt(π))
const K_SQRT3_DIV_2_SQRT_PI: f32 = 0.488_602_5;

/// sqrt(15) / (2 * sqrt(π))
const K_SQRT15_DIV_2_SQRT_PI: f32 = 1.092_548_4;

/// 3 * sqrt(5) / (4 * sqrt(π))
const K3_SQRT5_DIV_4_SQRT_PI: f32 = 0.946_174_7;

/// sqrt(15) / (4 * sqrt(π))
const K_SQRT15_DIV_4_SQRT_PI: f32 = 0.546_274_2;

/// sqrt(5) / (4 * sqrt(π)); the constant term of the sixth basis function
const K_ALMOST_ONE_THIRD: f32 = 0.315_391_57;

/// 16π / 17
pub const SH_NORMALIZATION: f32 = 2.956_793;

/// Evaluates the 9 real SH basis functions in direction `dir`.
pub fn sh_eval_direction(dir: Vec3) -> [f32; SH_COEFF_COUNT] {
    let Vec3 { x, y, z } = dir;

    [
        K1_DIV_2_SQRT_PI,
        -y * K_SQRT3_DIV_2_SQRT_PI,
        z * K_SQRT3_DIV_2_SQRT_PI,
        -x * K_SQRT3_DIV_2_SQRT_PI,
        x * y * K_SQRT15_DIV_2_SQRT_PI,
        -y * z * K_SQRT15_DIV_2_SQRT_PI,
        z * z * K3_SQRT5_DIV_4_SQRT_PI - K_ALMOST_ONE_THIRD,
        -x * z * K_SQRT15_DIV_2_SQRT_PI,
        (x * x - y * y) * K_SQRT15_DIV_4_SQRT_PI,
    ]
}

/// Projects radiance `color` arriving from `dir` onto the SH basis.
///
/// The alpha channel of each coefficient is always zero.
pub fn sh_project(
    color: Vec3,
    dir: Vec3,
    weight: f32,
) -> [Vec4; SH_COEFF_COUNT] {
    let sh = sh_eval_direction(dir);
    let mut out = [Vec4::ZERO; SH_COEFF_COUNT];
    let mut c = 0;

    while c < SH_COEFF_COUNT {
        out[c] = (color * sh[c] * SH_NORMALIZATION * weight).extend(0.0);
        c += 1;
    }

    out
}

/// Returns index of `coeff`-th coefficient of given probe; coefficients are
/// stored coefficient-major, i.e. all probes' first coefficients go first.
pub fn sh_slot(coeff: i32, probe_id: i32, probe_count: i32) -> i32 {
    probe_count * coeff + probe_id
}

/// Adds projection of `color` (arriving from `dir`) to probe's coefficients.
///
/// Not atomic: the caller must make sure no other work-item accumulates into
/// the same probe within a dispatch.
pub fn accumulate_sh(
    v: &mut impl Validate,
    out: &mut BufferViewMut<Vec4>,
    color: Vec3,
    dir: Vec3,
    weight: f32,
    probe_id: i32,
    probe_count: i32,
) {
    let coeffs = sh_project(color, dir, weight);

    scatter_sh(v, out, &coeffs, probe_id, probe_count);
}

/// Adds already projected coefficients to probe's coefficients.
pub fn scatter_sh(
    v: &mut impl Validate,
    out: &mut BufferViewMut<Vec4>,
    coeffs: &[Vec4; SH_COEFF_COUNT],
    probe_id: i32,
    probe_count: i32,
) {
    let mut c = 0;

    while c < SH_COEFF_COUNT {
        let slot = sh_slot(c as i32, probe_id, probe_count);

        out.update(v, slot, |sum| sum + coeffs[c]);
        c += 1;
    }
}
