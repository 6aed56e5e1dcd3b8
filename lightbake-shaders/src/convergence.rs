use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ConvergencePassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    texels: &[TexelSamples],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    output: &mut [ConvergenceOutputData],
) {
    run(&mut Unchecked, global_id, params, texels, output);
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ConvergencePassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    texels: &[TexelSamples],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    output: &mut [ConvergenceOutputData],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(&mut v, global_id, params, texels, output);
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &ConvergencePassParams,
    texels: &[TexelSamples],
    output: &mut [ConvergenceOutputData],
) {
    if global_id.x >= params.count {
        return;
    }

    let idx = global_id.x as i32;

    let stats = kernels::convergence(
        v,
        idx,
        params,
        &BufferView::new(texels, BufferId::TexelSamples),
    );

    BufferViewMut::new(output, BufferId::ConvergenceOutput)
        .set(v, idx, stats);
}
