use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &FinalGatherPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    env_texels: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    env_mip_offsets: &[i32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    requests: &[GatherRequest],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    radiance: &mut [Vec4],
) {
    run(
        &mut Unchecked,
        global_id,
        params,
        env_texels,
        env_mip_offsets,
        requests,
        radiance,
    );
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &FinalGatherPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    env_texels: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    env_mip_offsets: &[i32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    requests: &[GatherRequest],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    radiance: &mut [Vec4],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(
        &mut v,
        global_id,
        params,
        env_texels,
        env_mip_offsets,
        requests,
        radiance,
    );
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &FinalGatherPassParams,
    env_texels: &[Vec4],
    env_mip_offsets: &[i32],
    requests: &[GatherRequest],
    radiance: &mut [Vec4],
) {
    if global_id.x >= params.count {
        return;
    }

    let idx = global_id.x as i32;

    let env = EnvironmentMap {
        texels: BufferView::new(env_texels, BufferId::EnvMippedCubeTexels),
        mip_offsets: BufferView::new(env_mip_offsets, BufferId::EnvMipOffsets),
        dim: params.env.env_dim,
        num_mips: params.env.num_mips,
    };

    let color = kernels::final_gather(
        v,
        idx,
        params,
        &BufferView::new(requests, BufferId::GatherRequests),
        &env,
    );

    BufferViewMut::new(radiance, BufferId::Radiance).set(v, idx, color);
}
