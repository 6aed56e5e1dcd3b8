use core::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Builds an orthonormal basis around unit vector `n`.
///
/// See: "Building an Orthonormal Basis, Revisited" by Duff et al.
pub fn ortho_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = vec3(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = vec3(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}

/// Maps a sample from `[0, 1]^2` onto the unit disc, preserving relative
/// areas (concentric mapping).
///
/// See:
/// - http://psgraphics.blogspot.com/2011/01/improved-code-for-concentric-map.html
pub fn map_square_to_disk(uv: Vec2) -> Vec2 {
    let a = uv.x * 2.0 - 1.0;
    let b = uv.y * 2.0 - 1.0;

    let (r, phi) = if a * a > b * b {
        (a, (PI * 0.25) * (b / a))
    } else if b == 0.0 {
        (b, PI * 0.5)
    } else {
        (b, (PI * 0.5) - (PI * 0.25) * (a / b))
    };

    vec2(r * phi.cos(), r * phi.sin())
}

/// Result of sampling a spherical rectangle.
#[derive(Clone, Copy)]
pub struct SphQuadSample {
    pub point: Vec3,
    pub solid_angle: f32,
}

/// Samples a point on a rectangle uniformly in the solid angle it subtends
/// from `o`.
///
/// - `s` is a corner of the rectangle,
/// - `ex` and `ey` are its edges (their lengths are the rectangle's sizes),
/// - `u` and `v` are random numbers in `[0, 1]`.
///
/// See: "An Area-Preserving Parametrization for Spherical Rectangles" by
/// Ureña et al.
pub fn sph_quad_sample(
    s: Vec3,
    ex: Vec3,
    ey: Vec3,
    o: Vec3,
    u: f32,
    v: f32,
) -> SphQuadSample {
    let exl = ex.length();
    let eyl = ey.length();

    // Local reference system
    let x = ex / exl;
    let y = ey / eyl;
    let mut z = x.cross(y);

    let d = s - o;
    let mut z0 = d.dot(z);

    // Flip `z` so that it points against the rectangle
    if z0 > 0.0 {
        z = -z;
        z0 = -z0;
    }

    let z0sq = z0 * z0;
    let x0 = d.dot(x);
    let y0 = d.dot(y);
    let x1 = x0 + exl;
    let y1 = y0 + eyl;
    let y0sq = y0 * y0;
    let y1sq = y1 * y1;

    let v00 = vec3(x0, y0, z0);
    let v01 = vec3(x0, y1, z0);
    let v10 = vec3(x1, y0, z0);
    let v11 = vec3(x1, y1, z0);

    // Normals of the edges
    let n0 = v00.cross(v10).normalize();
    let n1 = v10.cross(v11).normalize();
    let n2 = v11.cross(v01).normalize();
    let n3 = v01.cross(v00).normalize();

    // Internal angles
    let g0 = (-n0.dot(n1)).acos();
    let g1 = (-n1.dot(n2)).acos();
    let g2 = (-n2.dot(n3)).acos();
    let g3 = (-n3.dot(n0)).acos();

    let b0 = n0.z;
    let b1 = n2.z;
    let b0sq = b0 * b0;
    let k = 2.0 * PI - g2 - g3;
    let solid_angle = g0 + g1 - k;

    // 1. cu
    let au = u * solid_angle + k;
    let fu = (au.cos() * b0 - b1) / au.sin();
    let cu = 1.0 / (fu * fu + b0sq).sqrt() * if fu > 0.0 { 1.0 } else { -1.0 };
    let cu = cu.max(-1.0).min(1.0);

    // 2. xu
    let xu = -(cu * z0) / (1.0 - cu * cu).sqrt();
    let xu = xu.max(x0).min(x1);

    // 3. yv
    let dd = (xu * xu + z0sq).sqrt();
    let h0 = y0 / (dd * dd + y0sq).sqrt();
    let h1 = y1 / (dd * dd + y1sq).sqrt();
    let hv = h0 + v * (h1 - h0);
    let hv2 = hv * hv;

    let yv = if hv2 < 1.0 - 0.0001 {
        (hv * dd) / (1.0 - hv2).sqrt()
    } else {
        y1
    };

    SphQuadSample {
        point: o + xu * x + yv * y + z0 * z,
        solid_angle,
    }
}
