use bytemuck::{Pod, Zeroable};

/// Boolean properties of a material instance, stored as bits of
/// [`MaterialTextureProperties::flags`].
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum MaterialFlag {
    UseTransmission = 0,

    /// Clamp along U (repeat is the default).
    ClampU = 1,

    /// Clamp along V (repeat is the default).
    ClampV = 2,

    /// Nearest-texel filtering (bilinear is the default).
    PointFilter = 3,

    CastShadows = 4,
    DoubleSidedGi = 5,
    OddNegativeScale = 6,
}

impl MaterialFlag {
    #[cfg(not(target_arch = "spirv"))]
    pub const ALL: [Self; 7] = [
        Self::UseTransmission,
        Self::ClampU,
        Self::ClampV,
        Self::PointFilter,
        Self::CastShadows,
        Self::DoubleSidedGi,
        Self::OddNegativeScale,
    ];

    fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// Location of a material's texture inside a texture atlas, together with
/// the material's flags.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct MaterialTextureProperties {
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub flags: u32,
}

impl MaterialTextureProperties {
    pub fn new(offset: i32, width: i32, height: i32) -> Self {
        Self {
            offset,
            width,
            height,
            flags: 0,
        }
    }

    pub fn flag(&self, flag: MaterialFlag) -> bool {
        self.flags & flag.mask() > 0
    }

    pub fn set_flag(&mut self, flag: MaterialFlag, value: bool) {
        self.flags &= !flag.mask();

        if value {
            self.flags |= flag.mask();
        }
    }

    pub fn with_flag(mut self, flag: MaterialFlag, value: bool) -> Self {
        self.set_flag(flag, value);
        self
    }

    /// Returns the atlas offset of texel `(x, y)`.
    ///
    /// Each axis is either clamped into `[0, dim - 1]` or wrapped around,
    /// depending on [`MaterialFlag::ClampU`] / [`MaterialFlag::ClampV`];
    /// `force_clamp` clamps both axes regardless of the flags.
    ///
    /// Textures with a zero dimension behave as if the dimension was one.
    pub fn fetch_offset(&self, x: i32, y: i32, force_clamp: bool) -> i32 {
        let width = self.width.max(1);
        let height = self.height.max(1);

        let x = if force_clamp || self.flag(MaterialFlag::ClampU) {
            x.max(0).min(width - 1)
        } else {
            x.rem_euclid(width)
        };

        let y = if force_clamp || self.flag(MaterialFlag::ClampV) {
            y.max(0).min(height - 1)
        } else {
            y.rem_euclid(height)
        };

        self.offset + width * y + x
    }
}
