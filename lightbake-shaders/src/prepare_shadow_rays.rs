use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &PrepareShadowRaysPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    lights: &[LightBuffer],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    requests: &[ShadowRayRequest],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    rays: &mut [Ray],
) {
    run(&mut Unchecked, global_id, params, lights, requests, rays);
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &PrepareShadowRaysPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    lights: &[LightBuffer],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    requests: &[ShadowRayRequest],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    rays: &mut [Ray],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(&mut v, global_id, params, lights, requests, rays);
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &PrepareShadowRaysPassParams,
    lights: &[LightBuffer],
    requests: &[ShadowRayRequest],
    rays: &mut [Ray],
) {
    if global_id.x >= params.count {
        return;
    }

    let idx = global_id.x as i32;

    let ray = kernels::prepare_shadow_rays(
        v,
        idx,
        params,
        &BufferView::new(requests, BufferId::ShadowRayRequests),
        &BufferView::new(lights, BufferId::Lights),
    );

    BufferViewMut::new(rays, BufferId::LightRays).set(v, idx, ray);
}
