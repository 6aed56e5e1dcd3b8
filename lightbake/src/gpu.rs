mod bind_group;
mod buffer;
mod pass;

use std::mem;

use bytemuck::Pod;
use glam::Vec4;
use lightbake_gpu::{
    AccumulateProbeShPassParams, BufferId, ConvergenceOutputData,
    ConvergencePassParams, EncodeRgbmPassParams, FinalGatherPassParams,
    GatherRequest, HitSurface, Intersection, KernelFault,
    PrepareShadowRaysPassParams, ProbeSample, Ray, ResolveHitsPassParams,
    ShadeDirectPassParams, ShadowRayRequest, TexelSamples,
};

pub use self::bind_group::*;
pub use self::buffer::*;
pub use self::pass::*;
use crate::{
    executor, fault, BakeConfig, BakeError, BufferCapacities, Executor, Scene,
};

/// Executor running kernels on the accelerator, through wgpu.
///
/// Kernels come from a SPIR-V module compiled by `lightbake-shader-builder`;
/// the scene is uploaded once, when the executor gets created, while inputs
/// and outputs of each operation live in buffers allocated per call.
#[derive(Debug)]
pub struct GpuExecutor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: BakeConfig,
    scene: SceneBuffers,
    capacities: BufferCapacities,
    env_dim: i32,
    env_num_mips: i32,
    fault: StorageBuffer,
    passes: Passes,
}

impl GpuExecutor {
    /// Features the device must be created with.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::PUSH_CONSTANTS
    }

    /// Limits the device must be created with.
    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: max_params_size(),
            ..Default::default()
        }
    }

    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        scene: &Scene,
        config: BakeConfig,
        spirv: &[u8],
    ) -> Result<Self, BakeError> {
        let missing = Self::required_features() - device.features();

        if !missing.is_empty() {
            return Err(BakeError::MissingFeatures(missing));
        }

        let supported = device.limits().max_push_constant_size;

        if supported < max_params_size() {
            return Err(BakeError::PushConstantsTooSmall {
                required: max_params_size(),
                supported,
            });
        }

        log::info!(
            "Initializing GPU executor; validation={:?}",
            config.validation
        );

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lightbake_shaders"),
            source: wgpu::util::make_spirv(spirv),
        });

        let passes =
            Passes::new(&device, &module, config.validation.is_enabled());

        let fault = StorageBuffer::zeroed::<KernelFault>(
            &device,
            "lightbake_fault",
            1,
        );

        Ok(Self {
            scene: SceneBuffers::new(&device, &queue, scene),
            capacities: scene.capacities(),
            env_dim: scene.env_dim(),
            env_num_mips: scene.env_num_mips(),
            device,
            queue,
            config,
            fault,
            passes,
        })
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    fn input<T>(&self, label: &str, items: &[T]) -> StorageBuffer
    where
        T: Pod,
    {
        StorageBuffer::new(&self.device, &self.queue, label, items)
    }

    fn output<T>(&self, label: &str, len: usize) -> StorageBuffer
    where
        T: Pod,
    {
        StorageBuffer::zeroed::<T>(&self.device, label, len)
    }

    fn read<T>(
        &self,
        buffer: &StorageBuffer,
        len: usize,
    ) -> Result<Vec<T>, BakeError>
    where
        T: Pod,
    {
        buffer.read(&self.device, &self.queue, len)
    }

    /// Submits a dispatch of `count` work-items; `items` get attached right
    /// after the capacity table and the fault record.
    fn dispatch<P>(
        &self,
        pass: &ComputePass<P>,
        params: P,
        count: usize,
        capacities: BufferCapacities,
        items: &[&dyn Bindable],
    ) -> Result<(), BakeError>
    where
        P: Pod,
    {
        let workgroups = workgroups(count);
        let supported =
            self.device.limits().max_compute_workgroups_per_dimension;

        if workgroups > supported {
            return Err(BakeError::DispatchTooLarge {
                count,
                workgroups,
                supported,
            });
        }

        if count == 0 {
            return Ok(());
        }

        let capacities =
            self.input("lightbake_capacities", capacities.as_slice());

        let mut bindings: Vec<&dyn Bindable> = vec![&capacities, &self.fault];

        bindings.extend_from_slice(items);

        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("lightbake_dispatch"),
                });

        pass.run(&self.device, &mut encoder, &bindings, params, count);
        self.queue.submit(Some(encoder.finish()));

        Ok(())
    }
}

impl Executor for GpuExecutor {
    fn prepare_shadow_rays(
        &mut self,
        requests: &[ShadowRayRequest],
    ) -> Result<Vec<Ray>, BakeError> {
        let count = requests.len();
        let requests = self.input("lightbake_shadow_ray_requests", requests);
        let rays = self.output::<Ray>("lightbake_light_rays", count);

        self.dispatch(
            &self.passes.prepare_shadow_rays,
            self.config.prepare_shadow_rays_params(count),
            count,
            self.capacities
                .with(BufferId::ShadowRayRequests, count)
                .with(BufferId::LightRays, count),
            &[&self.scene.lights, &requests, &rays],
        )?;

        self.read(&rays, count)
    }

    fn shade_direct(
        &mut self,
        requests: &[ShadowRayRequest],
        rays: &[Ray],
        occlusion: &[f32],
    ) -> Result<Vec<Vec4>, BakeError> {
        let count = requests.len();

        BakeError::ensure_len("rays", count, rays.len())?;
        BakeError::ensure_len("occlusion", count, occlusion.len())?;

        let requests = self.input("lightbake_shadow_ray_requests", requests);
        let rays = self.input("lightbake_light_rays", rays);
        let occlusion = self.input("lightbake_light_occlusion", occlusion);
        let radiance = self.output::<Vec4>("lightbake_radiance", count);

        self.dispatch(
            &self.passes.shade_direct,
            self.config.shade_direct_params(count),
            count,
            self.capacities
                .with(BufferId::ShadowRayRequests, count)
                .with(BufferId::LightRays, count)
                .with(BufferId::LightOcclusion, count)
                .with(BufferId::Radiance, count),
            &[
                &self.scene.lights,
                &self.scene.distance_falloffs,
                &self.scene.angular_falloffs,
                &requests,
                &rays,
                &occlusion,
                &radiance,
            ],
        )?;

        self.read(&radiance, count)
    }

    fn resolve_hits(
        &mut self,
        intersections: &[Intersection],
    ) -> Result<Vec<HitSurface>, BakeError> {
        let count = intersections.len();

        let intersections =
            self.input("lightbake_path_intersections", intersections);

        let surfaces =
            self.output::<HitSurface>("lightbake_hit_surfaces", count);
        let scene = &self.scene;

        self.dispatch(
            &self.passes.resolve_hits,
            self.config.resolve_hits_params(count),
            count,
            self.capacities
                .with(BufferId::PathIntersections, count)
                .with(BufferId::HitSurfaces, count),
            &[
                &scene.mesh_offsets,
                &scene.inv_transposed,
                &scene.uvs,
                &scene.positions,
                &scene.normals,
                &scene.indices,
                &scene.albedo_props,
                &scene.emissive_props,
                &scene.albedo_texels,
                &scene.emissive_texels,
                &intersections,
                &surfaces,
            ],
        )?;

        self.read(&surfaces, count)
    }

    fn final_gather(
        &mut self,
        requests: &[GatherRequest],
    ) -> Result<Vec<Vec4>, BakeError> {
        let count = requests.len();
        let requests = self.input("lightbake_gather_requests", requests);
        let radiance = self.output::<Vec4>("lightbake_radiance", count);

        self.dispatch(
            &self.passes.final_gather,
            self.config.final_gather_params(
                count,
                self.env_dim,
                self.env_num_mips,
            ),
            count,
            self.capacities
                .with(BufferId::GatherRequests, count)
                .with(BufferId::Radiance, count),
            &[
                &self.scene.env_texels,
                &self.scene.env_mip_offsets,
                &requests,
                &radiance,
            ],
        )?;

        self.read(&radiance, count)
    }

    /// Samples are dispatched in batches in which every probe appears at
    /// most once, since kernels add into probes without atomics.
    fn accumulate_probe_sh(
        &mut self,
        samples: &[ProbeSample],
        probe_sh: &mut [Vec4],
    ) -> Result<(), BakeError> {
        let probe_count = executor::probe_count(probe_sh)?;
        let out = self.input("lightbake_output_probe_sh", probe_sh);

        for batch in executor::partition_by_probe(samples) {
            let count = batch.len();
            let batch = self.input("lightbake_probe_samples", &batch);

            self.dispatch(
                &self.passes.accumulate_probe_sh,
                self.config.accumulate_probe_sh_params(count, probe_count),
                count,
                BufferCapacities::default()
                    .with(BufferId::ProbeSamples, count)
                    .with(BufferId::OutputProbeSh, probe_sh.len()),
                &[&batch, &out],
            )?;
        }

        let sh = self.read::<Vec4>(&out, probe_sh.len())?;

        probe_sh.copy_from_slice(&sh);

        Ok(())
    }

    fn encode_rgbm(
        &mut self,
        colors: &[Vec4],
        width: u32,
    ) -> Result<Vec<Vec4>, BakeError> {
        let count = colors.len();
        let height = executor::image_height(count, width)?;
        let len = (width as usize) * (height as usize);
        let colors = self.input("lightbake_rgbm_source", colors);
        let image = self.output::<Vec4>("lightbake_rgbm_image", len);

        self.dispatch(
            &self.passes.encode_rgbm,
            self.config.encode_rgbm_params(count, width),
            count,
            BufferCapacities::default()
                .with(BufferId::RgbmSource, count)
                .with(BufferId::DstImageWidth, width as usize)
                .with(BufferId::DstImageHeight, height as usize),
            &[&colors, &image],
        )?;

        self.read(&image, len)
    }

    /// Each work-item writes statistics of its own texel; those get merged
    /// after the read-back.
    fn convergence(
        &mut self,
        texels: &[TexelSamples],
    ) -> Result<ConvergenceOutputData, BakeError> {
        let count = texels.len();
        let texels = self.input("lightbake_texel_samples", texels);

        let stats = self.output::<ConvergenceOutputData>(
            "lightbake_convergence_output",
            count,
        );

        self.dispatch(
            &self.passes.convergence,
            self.config.convergence_params(count),
            count,
            BufferCapacities::default()
                .with(BufferId::TexelSamples, count)
                .with(BufferId::ConvergenceOutput, count),
            &[&texels, &stats],
        )?;

        Ok(self
            .read::<ConvergenceOutputData>(&stats, count)?
            .into_iter()
            .fold(Default::default(), ConvergenceOutputData::merge))
    }

    fn take_fault(&mut self) -> Result<Option<KernelFault>, BakeError> {
        let fault = self
            .read::<KernelFault>(&self.fault, 1)?
            .into_iter()
            .next()
            .filter(|fault| fault.is_some());

        if let Some(fault) = &fault {
            fault::log_fault(fault);

            self.fault.write(&self.queue, &[KernelFault::default()]);
        }

        Ok(fault)
    }
}

/// Scene, as uploaded to the accelerator.
#[derive(Debug)]
struct SceneBuffers {
    lights: StorageBuffer,
    distance_falloffs: StorageBuffer,
    angular_falloffs: StorageBuffer,
    mesh_offsets: StorageBuffer,
    inv_transposed: StorageBuffer,
    uvs: StorageBuffer,
    positions: StorageBuffer,
    normals: StorageBuffer,
    indices: StorageBuffer,
    albedo_props: StorageBuffer,
    emissive_props: StorageBuffer,
    albedo_texels: StorageBuffer,
    emissive_texels: StorageBuffer,
    env_texels: StorageBuffer,
    env_mip_offsets: StorageBuffer,
}

impl SceneBuffers {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
    ) -> Self {
        fn upload<T>(
            device: &wgpu::Device,
            queue: &wgpu::Queue,
            label: &str,
            items: &[T],
        ) -> StorageBuffer
        where
            T: Pod,
        {
            let label = format!("lightbake_{label}");

            StorageBuffer::new(device, queue, label, items)
        }

        Self {
            lights: upload(device, queue, "lights", &scene.lights),
            distance_falloffs: upload(
                device,
                queue,
                "distance_falloffs",
                &scene.distance_falloffs,
            ),
            angular_falloffs: upload(
                device,
                queue,
                "angular_falloffs",
                &scene.angular_falloffs,
            ),
            mesh_offsets: upload(
                device,
                queue,
                "mesh_offsets",
                &scene.mesh_offsets,
            ),
            inv_transposed: upload(
                device,
                queue,
                "inv_transposed",
                &scene.inv_transposed,
            ),
            uvs: upload(device, queue, "uvs", &scene.uvs),
            positions: upload(device, queue, "positions", &scene.positions),
            normals: upload(device, queue, "normals", &scene.normals),
            indices: upload(device, queue, "indices", &scene.indices),
            albedo_props: upload(
                device,
                queue,
                "albedo_props",
                &scene.albedo_props,
            ),
            emissive_props: upload(
                device,
                queue,
                "emissive_props",
                &scene.emissive_props,
            ),
            albedo_texels: upload(
                device,
                queue,
                "albedo_texels",
                &scene.albedo_texels,
            ),
            emissive_texels: upload(
                device,
                queue,
                "emissive_texels",
                &scene.emissive_texels,
            ),
            env_texels: upload(device, queue, "env_texels", &scene.env_texels),
            env_mip_offsets: upload(
                device,
                queue,
                "env_mip_offsets",
                &scene.env_mip_offsets,
            ),
        }
    }
}

#[derive(Debug)]
struct Passes {
    prepare_shadow_rays: ComputePass<PrepareShadowRaysPassParams>,
    shade_direct: ComputePass<ShadeDirectPassParams>,
    resolve_hits: ComputePass<ResolveHitsPassParams>,
    final_gather: ComputePass<FinalGatherPassParams>,
    accumulate_probe_sh: ComputePass<AccumulateProbeShPassParams>,
    encode_rgbm: ComputePass<EncodeRgbmPassParams>,
    convergence: ComputePass<ConvergencePassParams>,
}

impl Passes {
    fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        checked: bool,
    ) -> Self {
        let entry_point = if checked { "main_checked" } else { "main" };

        // Bindings include the capacity table and the fault record, so the
        // same layout serves both flavours of each kernel
        Self {
            prepare_shadow_rays: compute_pass(
                device,
                module,
                "prepare_shadow_rays",
                entry_point,
                5,
            ),
            shade_direct: compute_pass(
                device,
                module,
                "shade_direct",
                entry_point,
                9,
            ),
            resolve_hits: compute_pass(
                device,
                module,
                "resolve_hits",
                entry_point,
                14,
            ),
            final_gather: compute_pass(
                device,
                module,
                "final_gather",
                entry_point,
                6,
            ),
            accumulate_probe_sh: compute_pass(
                device,
                module,
                "accumulate_probe_sh",
                entry_point,
                4,
            ),
            encode_rgbm: compute_pass(
                device,
                module,
                "encode_rgbm",
                entry_point,
                4,
            ),
            convergence: compute_pass(
                device,
                module,
                "convergence",
                entry_point,
                4,
            ),
        }
    }
}

fn compute_pass<P>(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    kernel: &str,
    entry_point: &str,
    bindings: u32,
) -> ComputePass<P>
where
    P: Pod,
{
    ComputePass::new(
        device,
        module,
        kernel,
        &format!("{kernel}::{entry_point}"),
        bindings,
    )
}

fn max_params_size() -> u32 {
    [
        mem::size_of::<PrepareShadowRaysPassParams>(),
        mem::size_of::<ShadeDirectPassParams>(),
        mem::size_of::<ResolveHitsPassParams>(),
        mem::size_of::<FinalGatherPassParams>(),
        mem::size_of::<AccumulateProbeShPassParams>(),
        mem::size_of::<EncodeRgbmPassParams>(),
        mem::size_of::<ConvergencePassParams>(),
    ]
    .into_iter()
    .max()
    .unwrap_or_default() as u32
}
