use core::f32::consts::PI;

use glam::{vec2, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    map_square_to_disk, ortho_basis, sph_quad_sample, Light, LightBuffer,
    LightKind, Ray, SurfaceMode, Validate, Vec3Ext,
};

/// Max distance of rays shot towards directional lights.
pub const DIRECTIONAL_LIGHT_DISTANCE: f32 = 1e6;

/// Per-dispatch knobs of shadow-ray construction.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadowRayOptions {
    /// Distance the ray's origin is pushed along the surface normal
    pub push_off: f32,

    /// When set, punctual lights are not jittered
    pub force_hard_shadow: bool,

    pub surface_mode: SurfaceMode,
}

/// Point a shadow ray is shot from.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadowRaySurface {
    pub position: Vec3,

    /// Zero (or otherwise degenerate) normals disable the facing test
    pub normal: Vec3,

    pub texel_idx: i32,
}

/// Builds a shadow ray from `surface` towards `light`.
///
/// `sample` is a pair of random numbers in `[0, 1]` used either to pick a
/// point on area lights or to jitter punctual ones. Rejected samples yield an
/// inactive ray; the returned ray always carries `surface.texel_idx`.
pub fn prepare_shadow_ray(
    v: &mut impl Validate,
    light: LightBuffer,
    surface: ShadowRaySurface,
    sample: Vec2,
    opts: ShadowRayOptions,
) -> Ray {
    let Some(light) = light.decode() else {
        v.assert(false, line!());

        return Ray::inactive().with_texel_idx(surface.texel_idx);
    };

    shadow_ray(light, surface, sample, opts)
        .unwrap_or_else(Ray::inactive)
        .with_texel_idx(surface.texel_idx)
}

fn shadow_ray(
    light: Light,
    surface: ShadowRaySurface,
    sample: Vec2,
    opts: ShadowRayOptions,
) -> Option<Ray> {
    let origin = match opts.surface_mode {
        SurfaceMode::Texel => surface.position + surface.normal * opts.push_off,
        SurfaceMode::Probe => surface.position,
    };

    let is_directional = matches!(light.kind, LightKind::Directional);

    let max_distance = if is_directional {
        DIRECTIONAL_LIGHT_DISTANCE
    } else {
        (light.position - surface.position).length()
    };

    if !is_directional && max_distance > light.range {
        return None;
    }

    let punctual = |direction: Vec3| {
        let n_dot_l =
            facing(direction, surface.normal, opts.surface_mode)?;

        let direction = if opts.force_hard_shadow {
            direction
        } else {
            jitter(&light, direction, max_distance, sample)
        };

        Some(Ray::new(
            origin,
            direction,
            max_distance,
            n_dot_l,
            Ray::MASK_ALL,
        ))
    };

    match light.kind {
        LightKind::Spot { cos_cone_angle, .. } => {
            let direction = (light.position - surface.position).normalize();

            if direction.dot(-light.direction) < cos_cone_angle {
                return None;
            }

            punctual(direction)
        }

        LightKind::Directional => punctual(-light.direction.normalize()),

        LightKind::Point { .. } => {
            punctual((light.position - surface.position).normalize())
        }

        LightKind::Rectangle {
            width,
            height,
            tangent,
            bitangent,
            ..
        } => {
            if !faces_surface(&light, surface.position) {
                return None;
            }

            let corner = light.position
                - 0.5 * width * bitangent
                - 0.5 * height * tangent;

            let sample = sph_quad_sample(
                corner,
                tangent * height,
                bitangent * width,
                surface.position,
                sample.x,
                sample.y,
            );

            if sample.solid_angle.is_nan() {
                return None;
            }

            let (direction, distance) = direction_to(surface, sample.point);
            let n_dot_l =
                facing(direction, surface.normal, opts.surface_mode)?;

            Some(Ray::new(
                origin,
                direction,
                distance,
                sample.solid_angle * n_dot_l,
                Ray::MASK_ALL,
            ))
        }

        LightKind::Disc {
            radius, tangent, ..
        } => {
            if !faces_surface(&light, surface.position) {
                return None;
            }

            let r = sample.x.sqrt();
            let theta = 2.0 * PI * sample.y;
            let local = vec2(theta.cos(), theta.sin()) * r * radius;

            let tangent = -tangent.normalize();
            let cotangent = light.direction.normalize().cross(tangent);
            let point =
                light.position + local.x * tangent + local.y * cotangent;

            let (direction, distance) = direction_to(surface, point);
            let n_dot_l =
                facing(direction, surface.normal, opts.surface_mode)?;

            Some(Ray::new(
                origin,
                direction,
                distance,
                n_dot_l,
                Ray::MASK_ALL,
            ))
        }
    }
}

/// Returns n·l, or `None` if the surface faces away from the light.
fn facing(direction: Vec3, normal: Vec3, mode: SurfaceMode) -> Option<f32> {
    if let SurfaceMode::Probe = mode {
        return Some(1.0);
    }

    let n_dot_l = if normal.is_valid_normal() {
        direction.dot(normal)
    } else {
        1.0
    };

    // Also rejects NaNs
    if n_dot_l >= 0.0 {
        Some(n_dot_l)
    } else {
        None
    }
}

/// Checks whether an area light's emitting side faces `position`.
fn faces_surface(light: &Light, position: Vec3) -> bool {
    light.direction.normalize().dot(position - light.position) >= 0.0
}

fn direction_to(surface: ShadowRaySurface, point: Vec3) -> (Vec3, f32) {
    let direction = point - surface.position;
    let distance = direction.length();

    (direction / distance, distance)
}

/// Offsets `direction` within a disc of the light's shadow radius, placed
/// around the light (or one unit away, for directional lights).
fn jitter(
    light: &Light,
    direction: Vec3,
    max_distance: f32,
    sample: Vec2,
) -> Vec3 {
    let distance = if let LightKind::Directional = light.kind {
        1.0
    } else {
        max_distance
    };

    let (u, v) = ortho_basis(direction);
    let offset = light.shadow_radius * map_square_to_disk(sample);

    (direction * distance + offset.x * u + offset.y * v).normalize()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::{BufferId, Checked, FaultReason, KernelFault, Unchecked};

    fn light(kind: LightKind) -> Light {
        Light {
            position: vec3(0.0, 4.0, 0.0),
            shadow_radius: 0.0,
            color: Vec3::ONE,
            intensity: 1.0,
            direction: Vec3::NEG_Y,
            range: 10.0,
            direct_bake_mode: -2,
            probe_occlusion_light_index: -1,
            cast_shadow: true,
            kind,
        }
    }

    fn point() -> Light {
        light(LightKind::Point { falloff_index: 0 })
    }

    fn surface() -> ShadowRaySurface {
        ShadowRaySurface {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            texel_idx: 17,
        }
    }

    fn opts() -> ShadowRayOptions {
        ShadowRayOptions {
            push_off: 0.01,
            force_hard_shadow: true,
            surface_mode: SurfaceMode::Texel,
        }
    }

    fn prepare(light: Light, surface: ShadowRaySurface) -> Ray {
        prepare_with(light, surface, vec2(0.3, 0.7), opts())
    }

    fn prepare_with(
        light: Light,
        surface: ShadowRaySurface,
        sample: Vec2,
        opts: ShadowRayOptions,
    ) -> Ray {
        let light = light.encode();

        prepare_shadow_ray(&mut Unchecked, light, surface, sample, opts)
    }

    #[test]
    fn point_light() {
        let ray = prepare(point(), surface());

        assert!(ray.is_active());
        assert_eq!(17, ray.texel_idx);
        assert_eq!(4.0, ray.max_distance());
        assert_eq!(1.0, ray.attenuation());
        assert_eq!(Vec3::Y, ray.direction());
        assert_eq!(vec3(0.0, 0.01, 0.0), ray.origin());
    }

    #[test]
    fn point_out_of_range() {
        let light = Light {
            range: 3.9,
            ..point()
        };

        let ray = prepare(light, surface());

        assert!(!ray.is_active());
        assert_eq!(17, ray.texel_idx);
    }

    #[test]
    fn point_behind_surface() {
        let surface = ShadowRaySurface {
            normal: Vec3::NEG_Y,
            ..surface()
        };

        assert!(!prepare(point(), surface).is_active());
    }

    #[test]
    fn invalid_normal_disables_facing_test() {
        let surface = ShadowRaySurface {
            normal: Vec3::ZERO,
            ..surface()
        };

        let ray = prepare(point(), surface);

        assert!(ray.is_active());
        assert_eq!(1.0, ray.attenuation());
    }

    #[test]
    fn probes_skip_push_off_and_facing_test() {
        let surface = ShadowRaySurface {
            normal: Vec3::NEG_Y,
            ..surface()
        };

        let opts = ShadowRayOptions {
            surface_mode: SurfaceMode::Probe,
            ..opts()
        };

        let ray = prepare_with(point(), surface, vec2(0.5, 0.5), opts);

        assert!(ray.is_active());
        assert_eq!(Vec3::ZERO, ray.origin());
        assert_eq!(1.0, ray.attenuation());
    }

    #[test]
    fn spot_cone() {
        let spot = |direction| {
            let light = light(LightKind::Spot {
                falloff_index: 0,
                cos_cone_angle: 0.9,
                inv_cos_cone_angle: 10.0,
                cotan_cone_angle: 2.0,
            });

            Light { direction, ..light }
        };

        assert!(prepare(spot(Vec3::NEG_Y), surface()).is_active());

        let tilted = vec3(1.0, -1.0, 0.0).normalize();

        assert!(!prepare(spot(tilted), surface()).is_active());
    }

    #[test]
    fn directional() {
        let light = Light {
            position: vec3(0.0, -100.0, 0.0),
            direction: vec3(-1.0, -1.0, 0.0),
            range: 0.0,
            ..light(LightKind::Directional)
        };

        let ray = prepare(light, surface());

        assert!(ray.is_active());
        assert_eq!(DIRECTIONAL_LIGHT_DISTANCE, ray.max_distance());

        let expected = vec3(1.0, 1.0, 0.0).normalize();

        assert_relative_eq!(expected.x, ray.direction().x);
        assert_relative_eq!(expected.y, ray.direction().y);
        assert_relative_eq!(expected.z, ray.direction().z);
        assert_relative_eq!(expected.y, ray.attenuation());
    }

    #[test]
    fn jitter_stays_within_shadow_radius() {
        let mut rng = StdRng::seed_from_u64(1234);

        let light = Light {
            shadow_radius: 0.5,
            ..point()
        };

        let opts = ShadowRayOptions {
            force_hard_shadow: false,
            ..opts()
        };

        // The jittered direction must pass through a disc of radius 0.5
        // around the light (placed 4 units away)
        let max_angle = (0.5f32 / 4.0).atan();
        let mut any_jitter = false;

        for _ in 0..256 {
            let sample = vec2(rng.gen(), rng.gen());
            let ray = prepare_with(light, surface(), sample, opts);

            assert!(ray.is_active());
            assert_relative_eq!(
                1.0,
                ray.direction().length(),
                epsilon = 1e-5
            );

            let angle = ray.direction().dot(Vec3::Y).min(1.0).acos();

            assert!(angle <= max_angle + 1e-4);

            any_jitter |= angle > 1e-3;
        }

        assert!(any_jitter);
    }

    fn rectangle() -> Light {
        light(LightKind::Rectangle {
            width: 1.0,
            height: 1.0,
            normal: Vec3::NEG_Y,
            tangent: Vec3::X,
            bitangent: Vec3::Z,
        })
    }

    #[test]
    fn rectangle_samples_land_on_the_light() {
        let mut rng = StdRng::seed_from_u64(1234);

        for _ in 0..256 {
            let sample = vec2(rng.gen(), rng.gen());
            let ray = prepare_with(rectangle(), surface(), sample, opts());

            assert!(ray.is_active());
            assert!(ray.attenuation() > 0.0);

            let hit = ray.direction() * ray.max_distance();

            assert_relative_eq!(4.0, hit.y, epsilon = 1e-4);
            assert!(hit.x.abs() <= 0.5 + 1e-4);
            assert!(hit.z.abs() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn rectangle_facing_away() {
        let light = Light {
            direction: Vec3::Y,
            ..rectangle()
        };

        assert!(!prepare(light, surface()).is_active());
    }

    #[test]
    fn disc_samples_land_on_the_light() {
        let mut rng = StdRng::seed_from_u64(1234);

        let light = light(LightKind::Disc {
            radius: 0.5,
            normal: Vec3::NEG_Y,
            tangent: Vec3::X,
        });

        for _ in 0..256 {
            let sample = vec2(rng.gen(), rng.gen());
            let ray = prepare_with(light, surface(), sample, opts());

            assert!(ray.is_active());

            let hit = ray.direction() * ray.max_distance();

            assert_relative_eq!(4.0, hit.y, epsilon = 1e-4);
            assert!(vec2(hit.x, hit.z).length() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn unknown_light_type() {
        let capacities = [0; BufferId::COUNT];
        let mut fault = KernelFault::default();
        let mut v = Checked::new(&capacities, &mut fault);

        let light = LightBuffer {
            light_type: 99,
            ..point().encode()
        };

        let ray =
            prepare_shadow_ray(&mut v, light, surface(), Vec2::ZERO, opts());

        assert!(!ray.is_active());
        assert_eq!(17, ray.texel_idx);
        assert_eq!(FaultReason::AssertionFailed, fault.reason());
    }
}
