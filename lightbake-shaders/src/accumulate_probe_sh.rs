use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &AccumulateProbeShPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    samples: &[ProbeSample],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    probe_sh: &mut [Vec4],
) {
    run(&mut Unchecked, global_id, params, samples, probe_sh);
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &AccumulateProbeShPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    samples: &[ProbeSample],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    probe_sh: &mut [Vec4],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(&mut v, global_id, params, samples, probe_sh);
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &AccumulateProbeShPassParams,
    samples: &[ProbeSample],
    probe_sh: &mut [Vec4],
) {
    if global_id.x >= params.count {
        return;
    }

    kernels::accumulate_probe_sh(
        v,
        global_id.x as i32,
        params,
        &BufferView::new(samples, BufferId::ProbeSamples),
        &mut BufferViewMut::new(probe_sh, BufferId::OutputProbeSh),
    );
}
