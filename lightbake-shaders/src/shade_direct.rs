use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ShadeDirectPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    lights: &[LightBuffer],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    distance_falloffs: &[f32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    angular_falloffs: &[f32],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    requests: &[ShadowRayRequest],
    #[spirv(descriptor_set = 0, binding = 6, storage_buffer)] rays: &[Ray],
    #[spirv(descriptor_set = 0, binding = 7, storage_buffer)]
    occlusion: &[f32],
    #[spirv(descriptor_set = 0, binding = 8, storage_buffer)]
    radiance: &mut [Vec4],
) {
    run(
        &mut Unchecked,
        global_id,
        params,
        lights,
        distance_falloffs,
        angular_falloffs,
        requests,
        rays,
        occlusion,
        radiance,
    );
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ShadeDirectPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    lights: &[LightBuffer],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    distance_falloffs: &[f32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    angular_falloffs: &[f32],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    requests: &[ShadowRayRequest],
    #[spirv(descriptor_set = 0, binding = 6, storage_buffer)] rays: &[Ray],
    #[spirv(descriptor_set = 0, binding = 7, storage_buffer)]
    occlusion: &[f32],
    #[spirv(descriptor_set = 0, binding = 8, storage_buffer)]
    radiance: &mut [Vec4],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(
        &mut v,
        global_id,
        params,
        lights,
        distance_falloffs,
        angular_falloffs,
        requests,
        rays,
        occlusion,
        radiance,
    );
}

#[allow(clippy::too_many_arguments)]
fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &ShadeDirectPassParams,
    lights: &[LightBuffer],
    distance_falloffs: &[f32],
    angular_falloffs: &[f32],
    requests: &[ShadowRayRequest],
    rays: &[Ray],
    occlusion: &[f32],
    radiance: &mut [Vec4],
) {
    if global_id.x >= params.count {
        return;
    }

    let idx = global_id.x as i32;

    let lighting = LightingView {
        lights: BufferView::new(lights, BufferId::Lights),
        falloffs: FalloffTables {
            distance: BufferView::new(
                distance_falloffs,
                BufferId::DistanceFalloffs,
            ),
            angular: BufferView::new(
                angular_falloffs,
                BufferId::AngularFalloffLut,
            ),
        },
    };

    let color = kernels::shade_direct(
        v,
        idx,
        &BufferView::new(requests, BufferId::ShadowRayRequests),
        &BufferView::new(rays, BufferId::LightRays),
        &BufferView::new(occlusion, BufferId::LightOcclusion),
        &lighting,
    );

    BufferViewMut::new(radiance, BufferId::Radiance).set(v, idx, color);
}
