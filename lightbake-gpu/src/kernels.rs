//! Bodies of lightbake's kernels, evaluated for a single work-item.
//!
//! Each function reads its inputs through views and returns its output, so
//! that both the accelerator entry points and the CPU executor can store the
//! result the way it suits them.

use glam::{ivec2, IVec2, Vec4, Vec4Swizzles};

use crate::{
    assert_position_is_occupied, prepare_shadow_ray, resolve_hit,
    rgbm_encode, scatter_sh, sh_project, shade_light,
    AccumulateProbeShPassParams, BufferView, BufferViewMut,
    ConvergenceOutputData, ConvergencePassParams, EncodeRgbmPassParams,
    EnvironmentMap, FinalGatherPassParams, GatherRequest, HitSurface,
    Intersection, LightBuffer, LightingView, MaterialsView, MeshesView,
    PrepareShadowRaysPassParams, ProbeSample, Ray, ShadowRayRequest,
    TexelSamples, Validate, SH_COEFF_COUNT,
};

pub fn prepare_shadow_rays(
    v: &mut impl Validate,
    idx: i32,
    params: &PrepareShadowRaysPassParams,
    requests: &BufferView<ShadowRayRequest>,
    lights: &BufferView<LightBuffer>,
) -> Ray {
    let request = requests.get(v, idx);

    assert_position_is_occupied(v, request.position);

    let light = lights.get(v, request.light_idx() as i32);

    prepare_shadow_ray(
        v,
        light,
        request.surface(),
        request.sample(),
        params.opts(),
    )
}

/// Returns radiance carried by `idx`-th shadow ray; `occlusion` holds each
/// ray's visibility, as resolved by the intersection engine (`0.0` for fully
/// occluded rays).
pub fn shade_direct(
    v: &mut impl Validate,
    idx: i32,
    requests: &BufferView<ShadowRayRequest>,
    rays: &BufferView<Ray>,
    occlusion: &BufferView<f32>,
    lighting: &LightingView,
) -> Vec4 {
    let ray = rays.get(v, idx);

    if !ray.is_active() {
        return Vec4::ZERO;
    }

    let visibility = occlusion.get(v, idx);

    if visibility <= 0.0 {
        return Vec4::ZERO;
    }

    let request = requests.get(v, idx);
    let light = lighting.lights.get(v, request.light_idx() as i32);

    let radiance = shade_light(
        v,
        light,
        &ray,
        request.position.xyz(),
        &lighting.falloffs,
    );

    (radiance * visibility).extend(0.0)
}

pub fn resolve_hits(
    v: &mut impl Validate,
    idx: i32,
    intersections: &BufferView<Intersection>,
    meshes: &MeshesView,
    materials: &MaterialsView,
) -> HitSurface {
    let hit = intersections.get(v, idx);
    resolve_hit(v, meshes, materials, hit)
}

/// Returns environment radiance seen by `idx`-th gather ray; rays that hit
/// the scene see nothing.
pub fn final_gather(
    v: &mut impl Validate,
    idx: i32,
    params: &FinalGatherPassParams,
    requests: &BufferView<GatherRequest>,
    env: &EnvironmentMap,
) -> Vec4 {
    let request = requests.get(v, idx);

    if !request.escaped() {
        return Vec4::ZERO;
    }

    env.final_gather(
        v,
        request.direction(),
        request.normal(),
        params.env.mip_offset_bias,
    )
}

/// Projects `idx`-th probe sample; returns the probe's index together with
/// the coefficients to add to it.
pub fn project_probe_sample(
    v: &mut impl Validate,
    idx: i32,
    samples: &BufferView<ProbeSample>,
) -> (i32, [Vec4; SH_COEFF_COUNT]) {
    let sample = samples.get(v, idx);

    let coeffs =
        sh_project(sample.color(), sample.direction(), sample.weight());

    (sample.probe_id(), coeffs)
}

/// Adds `idx`-th probe sample to its probe.
///
/// No two work-items of a single dispatch may target the same probe.
pub fn accumulate_probe_sh(
    v: &mut impl Validate,
    idx: i32,
    params: &AccumulateProbeShPassParams,
    samples: &BufferView<ProbeSample>,
    out: &mut BufferViewMut<Vec4>,
) {
    let (probe_id, coeffs) = project_probe_sample(v, idx, samples);

    scatter_sh(v, out, &coeffs, probe_id, params.probe_count as i32);
}

/// Encodes `idx`-th color; returns the encoded texel together with its
/// position in the destination image.
pub fn encode_rgbm(
    v: &mut impl Validate,
    idx: i32,
    params: &EncodeRgbmPassParams,
    source: &BufferView<Vec4>,
) -> (IVec2, Vec4) {
    let color = source.get(v, idx);
    let width = params.width.max(1) as i32;

    let texel = rgbm_encode(color.xyz(), params.max_range, params.threshold);

    (ivec2(idx % width, idx / width), texel)
}

/// Returns convergence statistics of `idx`-th texel alone; the caller merges
/// them with [`ConvergenceOutputData::merge()`].
pub fn convergence(
    v: &mut impl Validate,
    idx: i32,
    params: &ConvergencePassParams,
    texels: &BufferView<TexelSamples>,
) -> ConvergenceOutputData {
    let mut stats = ConvergenceOutputData::default();

    stats.record(
        texels.get(v, idx),
        params.max_direct_samples,
        params.max_gi_samples,
    );

    stats
}
