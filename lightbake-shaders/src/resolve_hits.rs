use lightbake_gpu::prelude::*;

#[spirv(compute(threads(64)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ResolveHitsPassParams,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    mesh_offsets: &[MeshDataOffsets],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    inv_transposed: &[Matrix4x4],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)] uvs: &[Vec2],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    positions: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 6, storage_buffer)]
    normals: &[PackedNormal],
    #[spirv(descriptor_set = 0, binding = 7, storage_buffer)]
    indices: &[u32],
    #[spirv(descriptor_set = 0, binding = 8, storage_buffer)]
    albedo_props: &[MaterialTextureProperties],
    #[spirv(descriptor_set = 0, binding = 9, storage_buffer)]
    emissive_props: &[MaterialTextureProperties],
    #[spirv(descriptor_set = 0, binding = 10, storage_buffer)]
    albedo_texels: &[GammaTexel],
    #[spirv(descriptor_set = 0, binding = 11, storage_buffer)]
    emissive_texels: &[LinearTexel],
    #[spirv(descriptor_set = 0, binding = 12, storage_buffer)]
    intersections: &[Intersection],
    #[spirv(descriptor_set = 0, binding = 13, storage_buffer)]
    surfaces: &mut [HitSurface],
) {
    let meshes = MeshesView {
        offsets: BufferView::new(
            mesh_offsets,
            BufferId::InstanceIdToMeshDataOffsets,
        ),
        inv_transposed: BufferView::new(
            inv_transposed,
            BufferId::InstanceIdToInvTransposedMatrices,
        ),
        uvs: BufferView::new(uvs, BufferId::GeometryUv1s),
        positions: BufferView::new(positions, BufferId::GeometryPositions),
        normals: BufferView::new(normals, BufferId::GeometryNormals),
        indices: BufferView::new(indices, BufferId::GeometryIndices),
    };

    let materials = materials(
        albedo_props,
        emissive_props,
        albedo_texels,
        emissive_texels,
    );

    run(
        &mut Unchecked,
        global_id,
        params,
        &meshes,
        &materials,
        intersections,
        surfaces,
    );
}

#[spirv(compute(threads(64)))]
pub fn main_checked(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ResolveHitsPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    capacities: &[u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    fault: &mut KernelFault,
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    mesh_offsets: &[MeshDataOffsets],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    inv_transposed: &[Matrix4x4],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)] uvs: &[Vec2],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    positions: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 6, storage_buffer)]
    normals: &[PackedNormal],
    #[spirv(descriptor_set = 0, binding = 7, storage_buffer)]
    indices: &[u32],
    #[spirv(descriptor_set = 0, binding = 8, storage_buffer)]
    albedo_props: &[MaterialTextureProperties],
    #[spirv(descriptor_set = 0, binding = 9, storage_buffer)]
    emissive_props: &[MaterialTextureProperties],
    #[spirv(descriptor_set = 0, binding = 10, storage_buffer)]
    albedo_texels: &[GammaTexel],
    #[spirv(descriptor_set = 0, binding = 11, storage_buffer)]
    emissive_texels: &[LinearTexel],
    #[spirv(descriptor_set = 0, binding = 12, storage_buffer)]
    intersections: &[Intersection],
    #[spirv(descriptor_set = 0, binding = 13, storage_buffer)]
    surfaces: &mut [HitSurface],
) {
    let mut v = Checked::new(capacities, DeviceFaultSink::new(fault));

    let meshes = MeshesView {
        offsets: BufferView::new(
            mesh_offsets,
            BufferId::InstanceIdToMeshDataOffsets,
        ),
        inv_transposed: BufferView::new(
            inv_transposed,
            BufferId::InstanceIdToInvTransposedMatrices,
        ),
        uvs: BufferView::new(uvs, BufferId::GeometryUv1s),
        positions: BufferView::new(positions, BufferId::GeometryPositions),
        normals: BufferView::new(normals, BufferId::GeometryNormals),
        indices: BufferView::new(indices, BufferId::GeometryIndices),
    };

    let materials = materials(
        albedo_props,
        emissive_props,
        albedo_texels,
        emissive_texels,
    );

    run(
        &mut v,
        global_id,
        params,
        &meshes,
        &materials,
        intersections,
        surfaces,
    );
}

fn materials<'a>(
    albedo_props: &'a [MaterialTextureProperties],
    emissive_props: &'a [MaterialTextureProperties],
    albedo_texels: &'a [GammaTexel],
    emissive_texels: &'a [LinearTexel],
) -> MaterialsView<'a> {
    MaterialsView {
        albedo_props: BufferView::new(
            albedo_props,
            BufferId::InstanceIdToAlbedoTextureProperties,
        ),
        emissive_props: BufferView::new(
            emissive_props,
            BufferId::InstanceIdToEmissiveTextureProperties,
        ),
        albedo: TextureAtlas::new(BufferView::new(
            albedo_texels,
            BufferId::AlbedoTextures,
        )),
        emission: TextureAtlas::new(BufferView::new(
            emissive_texels,
            BufferId::EmissiveTextures,
        )),
    }
}

fn run(
    v: &mut impl Validate,
    global_id: UVec3,
    params: &ResolveHitsPassParams,
    meshes: &MeshesView,
    materials: &MaterialsView,
    intersections: &[Intersection],
    surfaces: &mut [HitSurface],
) {
    if global_id.x >= params.count {
        return;
    }

    let idx = global_id.x as i32;

    let surface = kernels::resolve_hits(
        v,
        idx,
        &BufferView::new(intersections, BufferId::PathIntersections),
        meshes,
        materials,
    );

    BufferViewMut::new(surfaces, BufferId::HitSurfaces).set(v, idx, surface);
}
