use std::collections::HashMap;

use glam::Vec4;
use lightbake_gpu::{
    ConvergenceOutputData, GatherRequest, HitSurface, Intersection,
    KernelFault, ProbeSample, Ray, ShadowRayRequest, TexelSamples,
    SH_COEFF_COUNT,
};

use crate::BakeError;

/// Runs lightbake's kernels over whole batches of work-items.
///
/// Implemented by [`crate::CpuExecutor`] and [`crate::GpuExecutor`]; both
/// evaluate the same kernel bodies, so they agree up to floating-point
/// differences between the targets.
pub trait Executor {
    /// Builds one shadow ray per request.
    fn prepare_shadow_rays(
        &mut self,
        requests: &[ShadowRayRequest],
    ) -> Result<Vec<Ray>, BakeError>;

    /// Returns radiance carried by each shadow ray; `occlusion` holds the
    /// visibility of each ray, as resolved by the intersection engine.
    fn shade_direct(
        &mut self,
        requests: &[ShadowRayRequest],
        rays: &[Ray],
        occlusion: &[f32],
    ) -> Result<Vec<Vec4>, BakeError>;

    /// Resolves surface properties at each intersection.
    fn resolve_hits(
        &mut self,
        intersections: &[Intersection],
    ) -> Result<Vec<HitSurface>, BakeError>;

    /// Returns environment radiance seen by each gather ray.
    fn final_gather(
        &mut self,
        requests: &[GatherRequest],
    ) -> Result<Vec<Vec4>, BakeError>;

    /// Adds samples into `probe_sh`, which holds [`SH_COEFF_COUNT`]
    /// coefficients per probe, laid out coefficient-major.
    fn accumulate_probe_sh(
        &mut self,
        samples: &[ProbeSample],
        probe_sh: &mut [Vec4],
    ) -> Result<(), BakeError>;

    /// Encodes colors into an RGBM image of given width; the image has as
    /// many rows as needed to hold all colors, with the remainder of the last
    /// row left zeroed.
    fn encode_rgbm(
        &mut self,
        colors: &[Vec4],
        width: u32,
    ) -> Result<Vec<Vec4>, BakeError>;

    /// Summarizes sample counts of a lightmap's texels, telling whether the
    /// bake needs another pass; unoccupied texels are ignored.
    fn convergence(
        &mut self,
        texels: &[TexelSamples],
    ) -> Result<ConvergenceOutputData, BakeError>;

    /// Returns the first fault raised since the previous call, clearing it.
    fn take_fault(&mut self) -> Result<Option<KernelFault>, BakeError>;
}

pub(crate) fn probe_count(probe_sh: &[Vec4]) -> Result<usize, BakeError> {
    let probe_count = probe_sh.len() / SH_COEFF_COUNT;

    BakeError::ensure_len(
        "probe_sh",
        probe_count * SH_COEFF_COUNT,
        probe_sh.len(),
    )?;

    Ok(probe_count)
}

pub(crate) fn image_height(count: usize, width: u32) -> Result<u32, BakeError> {
    if width == 0 {
        return Err(BakeError::ZeroImageWidth);
    }

    Ok(count.div_ceil(width as usize) as u32)
}

/// Splits samples into batches in which every probe appears at most once, so
/// that each batch can be accumulated without two work-items writing into the
/// same coefficient.
///
/// Samples of a single probe keep their relative order across batches.
pub(crate) fn partition_by_probe(
    samples: &[ProbeSample],
) -> Vec<Vec<ProbeSample>> {
    let mut batches: Vec<Vec<ProbeSample>> = Vec::new();
    let mut seen = HashMap::new();

    for sample in samples {
        let batch = seen.entry(sample.probe_id()).or_insert(0);

        if *batch == batches.len() {
            batches.push(Vec::new());
        }

        batches[*batch].push(*sample);
        *batch += 1;
    }

    batches
}
