use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &EncodeRgbmPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    source: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    image: &mut [Vec4],
) {
    run(&mut Unchecked, global_id, params, source, image);
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &EncodeRgbmPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    source: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    image: &mut [Vec4],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    run(&mut v, global_id, params, source, image);
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &EncodeRgbmPassParams,
    source: &[Vec4],
    image: &mut [Vec4],
) {
    if global_id.x >= params.count {
        return;
    }

    let (pos, texel) = kernels::encode_rgbm(
        v,
        global_id.x as i32,
        params,
        &BufferView::new(source, BufferId::RgbmSource),
    );

    ImageViewMut::new(
        image,
        params.width,
        BufferId::DstImageWidth,
        BufferId::DstImageHeight,
    )
    .write(v, pos.x, pos.y, texel);
}
