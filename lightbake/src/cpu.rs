use glam::Vec4;
use lightbake_gpu::{
    kernels, scatter_sh, BufferId, BufferView, BufferViewMut, Checked,
    ConvergenceOutputData, GatherRequest, HitSurface, ImageViewMut,
    Intersection, KernelFault, ProbeSample, Ray, ShadowRayRequest,
    TexelSamples, Unchecked, Validate,
};
use rayon::prelude::*;

use crate::{
    executor, BakeConfig, BakeError, BufferCapacities, Executor, FaultRecord,
    HostFaultSink, Scene,
};

/// Reference executor, running kernels on the CPU; one work-item per rayon
/// task.
#[derive(Debug)]
pub struct CpuExecutor<'a> {
    scene: &'a Scene,
    config: BakeConfig,
    fault: FaultRecord,
}

impl<'a> CpuExecutor<'a> {
    pub fn new(scene: &'a Scene, config: BakeConfig) -> Self {
        log::debug!(
            "Initializing CPU executor; validation={:?}, threads={}",
            config.validation,
            rayon::current_num_threads(),
        );

        Self {
            scene,
            config,
            fault: Default::default(),
        }
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    fn validator<'v>(
        &'v self,
        capacities: &'v BufferCapacities,
    ) -> HostValidator<'v> {
        if self.config.validation.is_enabled() {
            HostValidator::Checked(Checked::new(
                capacities.as_slice(),
                self.fault.sink(),
            ))
        } else {
            HostValidator::Unchecked
        }
    }

    fn dispatch<T, F>(
        &self,
        capacities: &BufferCapacities,
        count: usize,
        kernel: F,
    ) -> Vec<T>
    where
        T: Send,
        F: Fn(&mut HostValidator<'_>, i32) -> T + Sync,
    {
        (0..count)
            .into_par_iter()
            .map(|idx| {
                let mut v = self.validator(capacities);

                kernel(&mut v, idx as i32)
            })
            .collect()
    }
}

impl Executor for CpuExecutor<'_> {
    fn prepare_shadow_rays(
        &mut self,
        requests: &[ShadowRayRequest],
    ) -> Result<Vec<Ray>, BakeError> {
        let params = self.config.prepare_shadow_rays_params(requests.len());

        let capacities = self
            .scene
            .capacities()
            .with(BufferId::ShadowRayRequests, requests.len());

        let requests = BufferView::new(requests, BufferId::ShadowRayRequests);
        let lights = BufferView::new(&self.scene.lights, BufferId::Lights);

        Ok(self.dispatch(&capacities, requests.len(), |v, idx| {
            kernels::prepare_shadow_rays(v, idx, &params, &requests, &lights)
        }))
    }

    fn shade_direct(
        &mut self,
        requests: &[ShadowRayRequest],
        rays: &[Ray],
        occlusion: &[f32],
    ) -> Result<Vec<Vec4>, BakeError> {
        BakeError::ensure_len("rays", requests.len(), rays.len())?;
        BakeError::ensure_len("occlusion", requests.len(), occlusion.len())?;

        let capacities = self
            .scene
            .capacities()
            .with(BufferId::ShadowRayRequests, requests.len())
            .with(BufferId::LightRays, rays.len())
            .with(BufferId::LightOcclusion, occlusion.len());

        let requests = BufferView::new(requests, BufferId::ShadowRayRequests);
        let rays = BufferView::new(rays, BufferId::LightRays);
        let occlusion = BufferView::new(occlusion, BufferId::LightOcclusion);
        let lighting = self.scene.lighting();

        Ok(self.dispatch(&capacities, requests.len(), |v, idx| {
            kernels::shade_direct(
                v,
                idx,
                &requests,
                &rays,
                &occlusion,
                &lighting,
            )
        }))
    }

    fn resolve_hits(
        &mut self,
        intersections: &[Intersection],
    ) -> Result<Vec<HitSurface>, BakeError> {
        let capacities = self
            .scene
            .capacities()
            .with(BufferId::PathIntersections, intersections.len());

        let intersections =
            BufferView::new(intersections, BufferId::PathIntersections);

        let meshes = self.scene.meshes();
        let materials = self.scene.materials();

        Ok(self.dispatch(&capacities, intersections.len(), |v, idx| {
            kernels::resolve_hits(v, idx, &intersections, &meshes, &materials)
        }))
    }

    fn final_gather(
        &mut self,
        requests: &[GatherRequest],
    ) -> Result<Vec<Vec4>, BakeError> {
        let params = self.config.final_gather_params(
            requests.len(),
            self.scene.env_dim(),
            self.scene.env_num_mips(),
        );

        let capacities = self
            .scene
            .capacities()
            .with(BufferId::GatherRequests, requests.len());

        let requests = BufferView::new(requests, BufferId::GatherRequests);
        let env = self.scene.environment();

        Ok(self.dispatch(&capacities, requests.len(), |v, idx| {
            kernels::final_gather(v, idx, &params, &requests, &env)
        }))
    }

    /// Projects samples in parallel, then adds them up in order; this keeps
    /// results deterministic no matter how samples target probes.
    fn accumulate_probe_sh(
        &mut self,
        samples: &[ProbeSample],
        probe_sh: &mut [Vec4],
    ) -> Result<(), BakeError> {
        let probe_count = executor::probe_count(probe_sh)?;

        let capacities = BufferCapacities::default()
            .with(BufferId::ProbeSamples, samples.len())
            .with(BufferId::OutputProbeSh, probe_sh.len());

        let samples = BufferView::new(samples, BufferId::ProbeSamples);

        let projected = self.dispatch(&capacities, samples.len(), |v, idx| {
            kernels::project_probe_sample(v, idx, &samples)
        });

        let mut v = self.validator(&capacities);
        let mut out = BufferViewMut::new(probe_sh, BufferId::OutputProbeSh);

        for (probe_id, coeffs) in projected {
            scatter_sh(&mut v, &mut out, &coeffs, probe_id, probe_count as i32);
        }

        Ok(())
    }

    fn encode_rgbm(
        &mut self,
        colors: &[Vec4],
        width: u32,
    ) -> Result<Vec<Vec4>, BakeError> {
        let height = executor::image_height(colors.len(), width)?;
        let params = self.config.encode_rgbm_params(colors.len(), width);

        let capacities = BufferCapacities::default()
            .with(BufferId::RgbmSource, colors.len())
            .with(BufferId::DstImageWidth, width as usize)
            .with(BufferId::DstImageHeight, height as usize);

        let colors = BufferView::new(colors, BufferId::RgbmSource);

        let texels = self.dispatch(&capacities, colors.len(), |v, idx| {
            kernels::encode_rgbm(v, idx, &params, &colors)
        });

        let mut image = vec![Vec4::ZERO; (width as usize) * (height as usize)];
        let mut v = self.validator(&capacities);

        let mut view = ImageViewMut::new(
            &mut image,
            width,
            BufferId::DstImageWidth,
            BufferId::DstImageHeight,
        );

        for (pos, texel) in texels {
            view.write(&mut v, pos.x, pos.y, texel);
        }

        Ok(image)
    }

    fn convergence(
        &mut self,
        texels: &[TexelSamples],
    ) -> Result<ConvergenceOutputData, BakeError> {
        let params = self.config.convergence_params(texels.len());

        let capacities = BufferCapacities::default()
            .with(BufferId::TexelSamples, texels.len())
            .with(BufferId::ConvergenceOutput, texels.len());

        let texels = BufferView::new(texels, BufferId::TexelSamples);

        let stats = self.dispatch(&capacities, texels.len(), |v, idx| {
            kernels::convergence(v, idx, &params, &texels)
        });

        Ok(stats
            .into_iter()
            .fold(Default::default(), ConvergenceOutputData::merge))
    }

    fn take_fault(&mut self) -> Result<Option<KernelFault>, BakeError> {
        Ok(self.fault.take())
    }
}

/// Validation policy picked at runtime, from [`BakeConfig::validation`].
enum HostValidator<'a> {
    Unchecked,
    Checked(Checked<'a, HostFaultSink<'a>>),
}

impl Validate for HostValidator<'_> {
    fn index(&mut self, idx: i32, buffer: BufferId, line: u32) -> usize {
        match self {
            HostValidator::Unchecked => Unchecked.index(idx, buffer, line),
            HostValidator::Checked(v) => v.index(idx, buffer, line),
        }
    }

    fn assert(&mut self, cond: bool, line: u32) {
        match self {
            HostValidator::Unchecked => Unchecked.assert(cond, line),
            HostValidator::Checked(v) => v.assert(cond, line),
        }
    }
}
