use bytemuck::{Pod, Zeroable};

pub fn is_direct_converged(samples: i32, max_samples: i32) -> bool {
    samples >= max_samples
}

pub fn is_gi_converged(samples: i32, max_samples: i32) -> bool {
    samples >= max_samples
}

/// Sample-count statistics of a lightmap, used by the bake loop to decide
/// whether another pass is needed.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ConvergenceOutputData {
    pub occupied_texel_count: u32,
    pub visible_converged_direct_texel_count: u32,
    pub visible_converged_gi_texel_count: u32,
    pub visible_texel_count: u32,
    pub converged_direct_texel_count: u32,
    pub converged_gi_texel_count: u32,
    pub total_direct_samples: u32,
    pub total_gi_samples: u32,
    pub min_direct_samples: i32,
    pub min_gi_samples: i32,
    pub max_direct_samples: i32,
    pub max_gi_samples: i32,
}

impl Default for ConvergenceOutputData {
    fn default() -> Self {
        Self {
            occupied_texel_count: 0,
            visible_converged_direct_texel_count: 0,
            visible_converged_gi_texel_count: 0,
            visible_texel_count: 0,
            converged_direct_texel_count: 0,
            converged_gi_texel_count: 0,
            total_direct_samples: 0,
            total_gi_samples: 0,
            min_direct_samples: i32::MAX,
            min_gi_samples: i32::MAX,
            max_direct_samples: 0,
            max_gi_samples: 0,
        }
    }
}

/// Sample counts of a single lightmap texel.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TexelSamples {
    pub direct: i32,
    pub gi: i32,

    /// `1` if the texel is visible from the scene's camera
    pub visible: u32,

    /// `0` for texels no geometry covers; those are skipped entirely
    pub occupied: u32,
}

impl TexelSamples {
    pub fn new(direct: i32, gi: i32, visible: bool) -> Self {
        Self {
            direct,
            gi,
            visible: visible as u32,
            occupied: 1,
        }
    }

    pub fn unoccupied() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible != 0
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied != 0
    }
}

impl ConvergenceOutputData {
    pub fn record(
        &mut self,
        texel: TexelSamples,
        max_direct_samples: i32,
        max_gi_samples: i32,
    ) {
        if !texel.is_occupied() {
            return;
        }

        let direct = is_direct_converged(texel.direct, max_direct_samples);
        let gi = is_gi_converged(texel.gi, max_gi_samples);

        self.occupied_texel_count += 1;
        self.converged_direct_texel_count += direct as u32;
        self.converged_gi_texel_count += gi as u32;

        if texel.is_visible() {
            self.visible_texel_count += 1;
            self.visible_converged_direct_texel_count += direct as u32;
            self.visible_converged_gi_texel_count += gi as u32;
        }

        self.total_direct_samples += texel.direct.max(0) as u32;
        self.total_gi_samples += texel.gi.max(0) as u32;
        self.min_direct_samples = self.min_direct_samples.min(texel.direct);
        self.min_gi_samples = self.min_gi_samples.min(texel.gi);
        self.max_direct_samples = self.max_direct_samples.max(texel.direct);
        self.max_gi_samples = self.max_gi_samples.max(texel.gi);
    }

    /// Combines statistics of two disjoint sets of texels.
    pub fn merge(self, other: Self) -> Self {
        Self {
            occupied_texel_count: self.occupied_texel_count
                + other.occupied_texel_count,
            visible_converged_direct_texel_count: self
                .visible_converged_direct_texel_count
                + other.visible_converged_direct_texel_count,
            visible_converged_gi_texel_count: self
                .visible_converged_gi_texel_count
                + other.visible_converged_gi_texel_count,
            visible_texel_count: self.visible_texel_count
                + other.visible_texel_count,
            converged_direct_texel_count: self.converged_direct_texel_count
                + other.converged_direct_texel_count,
            converged_gi_texel_count: self.converged_gi_texel_count
                + other.converged_gi_texel_count,
            total_direct_samples: self.total_direct_samples
                + other.total_direct_samples,
            total_gi_samples: self.total_gi_samples + other.total_gi_samples,
            min_direct_samples: self
                .min_direct_samples
                .min(other.min_direct_samples),
            min_gi_samples: self.min_gi_samples.min(other.min_gi_samples),
            max_direct_samples: self
                .max_direct_samples
                .max(other.max_direct_samples),
            max_gi_samples: self.max_gi_samples.max(other.max_gi_samples),
        }
    }

    pub fn is_converged(&self) -> bool {
        self.converged_direct_texel_count == self.occupied_texel_count
            && self.converged_gi_texel_count == self.occupied_texel_count
    }
}
