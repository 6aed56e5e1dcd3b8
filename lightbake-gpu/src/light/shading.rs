use core::f32::consts::PI;

use glam::Vec3;

use crate::{FalloffTables, Light, LightBuffer, LightKind, Ray, Validate};

/// Evaluates radiance arriving from `light` along an unoccluded, active
/// shadow ray built by [`crate::prepare_shadow_ray()`] from `position`.
pub fn shade_light(
    v: &mut impl Validate,
    light: LightBuffer,
    ray: &Ray,
    position: Vec3,
    falloffs: &FalloffTables,
) -> Vec3 {
    let Some(light) = light.decode() else {
        v.assert(false, line!());

        return Vec3::ZERO;
    };

    match light.kind {
        LightKind::Spot {
            falloff_index,
            cos_cone_angle,
            inv_cos_cone_angle,
            ..
        } => {
            let radiance = shade_point(v, &light, ray, falloffs, falloff_index);

            let cos_to_axis = (light.position - position)
                .normalize()
                .dot(-light.direction);

            let angular = falloffs.angular_falloff(
                v,
                (cos_to_axis - cos_cone_angle) / inv_cos_cone_angle,
            );

            radiance * (1.0 - angular)
        }

        LightKind::Directional => ray.attenuation() * light.color,

        LightKind::Point { falloff_index } => {
            shade_point(v, &light, ray, falloffs, falloff_index)
        }

        LightKind::Rectangle { .. } => ray.attenuation() / PI * light.color,

        // π terms cancel out
        LightKind::Disc { radius, normal, .. } => {
            let distance = ray.max_distance();
            let cos_light = normal.normalize().dot(-ray.direction());

            ray.attenuation() * radius * radius * cos_light
                / (distance * distance)
                * light.color
        }
    }
}

fn shade_point(
    v: &mut impl Validate,
    light: &Light,
    ray: &Ray,
    falloffs: &FalloffTables,
    falloff_index: u32,
) -> Vec3 {
    let distance_scale = ray.max_distance() / light.range;

    if distance_scale > 1.0 {
        return Vec3::ZERO;
    }

    let falloff = falloffs.distance_falloff(v, falloff_index, distance_scale);

    falloff * ray.attenuation() * light.color
}
