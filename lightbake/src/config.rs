use lightbake_gpu::{
    AccumulateProbeShPassParams, ConvergencePassParams, EncodeRgbmPassParams,
    EnvironmentLightingInputData, FinalGatherPassParams,
    PrepareShadowRaysPassParams, ResolveHitsPassParams,
    ShadeDirectPassParams, SurfaceMode,
};

/// Whether kernels check their memory accesses and assertions.
///
/// Both modes produce identical results for valid inputs; with validation
/// disabled an invalid index is undefined behaviour on the accelerator and a
/// panic on the CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    Enabled,
    #[default]
    Disabled,
}

impl Validation {
    pub fn is_enabled(self) -> bool {
        self == Validation::Enabled
    }
}

#[derive(Clone, Debug)]
pub struct BakeConfig {
    pub validation: Validation,

    /// Whether shadow rays start at lightmap texels or at light probes
    pub surface_mode: SurfaceMode,

    /// When set, shadow rays always target the light's center, ignoring its
    /// shadow radius
    pub force_hard_shadow: bool,

    /// Distance by which shadow rays get pushed off the surface, along its
    /// normal
    pub push_off: f32,

    /// Largest color representable by the RGBM encoding
    pub rgbm_max_range: f32,

    /// Minimum RGBM multiplier, as a fraction of `rgbm_max_range`
    pub rgbm_threshold: f32,

    pub environment: EnvironmentLightingInputData,

    /// Sample counts at which a texel's direct lighting and GI are
    /// considered converged
    pub max_direct_samples: i32,
    pub max_gi_samples: i32,
}

impl BakeConfig {
    pub(crate) fn prepare_shadow_rays_params(
        &self,
        count: usize,
    ) -> PrepareShadowRaysPassParams {
        PrepareShadowRaysPassParams {
            count: count as u32,
            surface_mode: self.surface_mode as u32,
            force_hard_shadow: self.force_hard_shadow as u32,
            push_off: self.push_off,
        }
    }

    pub(crate) fn shade_direct_params(
        &self,
        count: usize,
    ) -> ShadeDirectPassParams {
        ShadeDirectPassParams {
            count: count as u32,
        }
    }

    pub(crate) fn resolve_hits_params(
        &self,
        count: usize,
    ) -> ResolveHitsPassParams {
        ResolveHitsPassParams {
            count: count as u32,
        }
    }

    /// Environment map's dimensions come from the scene, overriding the ones
    /// in [`Self::environment`].
    pub(crate) fn final_gather_params(
        &self,
        count: usize,
        env_dim: i32,
        num_mips: i32,
    ) -> FinalGatherPassParams {
        FinalGatherPassParams {
            env: EnvironmentLightingInputData {
                env_dim,
                num_mips,
                ..self.environment
            },
            count: count as u32,
            ..Default::default()
        }
    }

    pub(crate) fn accumulate_probe_sh_params(
        &self,
        count: usize,
        probe_count: usize,
    ) -> AccumulateProbeShPassParams {
        AccumulateProbeShPassParams {
            count: count as u32,
            probe_count: probe_count as u32,
        }
    }

    pub(crate) fn encode_rgbm_params(
        &self,
        count: usize,
        width: u32,
    ) -> EncodeRgbmPassParams {
        EncodeRgbmPassParams {
            count: count as u32,
            width,
            max_range: self.rgbm_max_range,
            threshold: self.rgbm_threshold,
        }
    }

    pub(crate) fn convergence_params(
        &self,
        count: usize,
    ) -> ConvergencePassParams {
        ConvergencePassParams {
            count: count as u32,
            max_direct_samples: self.max_direct_samples,
            max_gi_samples: self.max_gi_samples,
            ..Default::default()
        }
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            validation: Default::default(),
            surface_mode: Default::default(),
            force_hard_shadow: false,
            push_off: 1e-4,
            rgbm_max_range: 5.0,
            rgbm_threshold: 1e-6,
            environment: Default::default(),
            max_direct_samples: 32,
            max_gi_samples: 512,
        }
    }
}
