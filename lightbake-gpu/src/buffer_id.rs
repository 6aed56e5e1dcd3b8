/// Identifies a device buffer in the capacity table uploaded by the host.
///
/// The discriminants are part of the host ↔ device contract: the capacity of
/// buffer `id` lives at `capacities[id as usize]`.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, Hash))]
pub enum BufferId {
    Invalid = 0,

    // Scene
    Lights,
    DistanceFalloffs,
    AngularFalloffLut,
    AlbedoTextures,
    EmissiveTextures,
    InstanceIdToAlbedoTextureProperties,
    InstanceIdToEmissiveTextureProperties,
    InstanceIdToMeshDataOffsets,
    InstanceIdToInvTransposedMatrices,
    GeometryUv1s,
    GeometryPositions,
    GeometryNormals,
    GeometryIndices,
    EnvMippedCubeTexels,
    EnvMipOffsets,

    // Per-dispatch
    ShadowRayRequests,
    LightRays,
    LightOcclusion,
    PathIntersections,
    HitSurfaces,
    GatherRequests,
    Radiance,
    ProbeSamples,
    OutputProbeSh,
    RgbmSource,
    TexelSamples,
    ConvergenceOutput,

    // Images; one id per axis
    DstImageWidth,
    DstImageHeight,
}

impl BufferId {
    /// Number of entries the capacity table must have.
    pub const COUNT: usize = BufferId::DstImageHeight as usize + 1;

    #[cfg(not(target_arch = "spirv"))]
    pub const ALL: [BufferId; Self::COUNT] = [
        BufferId::Invalid,
        BufferId::Lights,
        BufferId::DistanceFalloffs,
        BufferId::AngularFalloffLut,
        BufferId::AlbedoTextures,
        BufferId::EmissiveTextures,
        BufferId::InstanceIdToAlbedoTextureProperties,
        BufferId::InstanceIdToEmissiveTextureProperties,
        BufferId::InstanceIdToMeshDataOffsets,
        BufferId::InstanceIdToInvTransposedMatrices,
        BufferId::GeometryUv1s,
        BufferId::GeometryPositions,
        BufferId::GeometryNormals,
        BufferId::GeometryIndices,
        BufferId::EnvMippedCubeTexels,
        BufferId::EnvMipOffsets,
        BufferId::ShadowRayRequests,
        BufferId::LightRays,
        BufferId::LightOcclusion,
        BufferId::PathIntersections,
        BufferId::HitSurfaces,
        BufferId::GatherRequests,
        BufferId::Radiance,
        BufferId::ProbeSamples,
        BufferId::OutputProbeSh,
        BufferId::RgbmSource,
        BufferId::TexelSamples,
        BufferId::ConvergenceOutput,
        BufferId::DstImageWidth,
        BufferId::DstImageHeight,
    ];

    pub fn get(self) -> u32 {
        self as u32
    }

    #[cfg(not(target_arch = "spirv"))]
    pub fn from_raw(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}
