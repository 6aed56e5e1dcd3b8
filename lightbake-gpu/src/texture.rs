use glam::{Vec2, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    gamma_to_linear_rgb, BufferView, MaterialFlag, MaterialTextureProperties,
    U32Ext, Validate, Vec2Ext,
};

/// Texel stored as four linear floats.
pub type LinearTexel = Vec4;

/// Texel stored as RGBA8 in gamma space (red in the lowest byte).
pub type GammaTexel = u32;

/// Physical encoding of texels inside a texture atlas.
pub trait TexelFormat: Copy {
    /// Returns this texel as a linear-space color.
    fn to_linear(self) -> Vec4;
}

impl TexelFormat for LinearTexel {
    fn to_linear(self) -> Vec4 {
        self
    }
}

impl TexelFormat for GammaTexel {
    fn to_linear(self) -> Vec4 {
        gamma_to_linear_rgb(self.unpack_rgba8())
    }
}

/// Texture atlas shared by many materials; each material addresses its own
/// rectangle through [`MaterialTextureProperties`].
#[derive(Clone, Copy)]
pub struct TextureAtlas<'a, T> {
    texels: BufferView<'a, T>,
}

impl<'a, T> TextureAtlas<'a, T>
where
    T: TexelFormat,
{
    pub fn new(texels: BufferView<'a, T>) -> Self {
        Self { texels }
    }

    /// Samples the material's texture at `uv`.
    ///
    /// NaN coordinates are treated as `(0, 0)`; `force_clamp` (used for
    /// G-buffer style lookups) forces both clamping and nearest filtering.
    pub fn fetch(
        &self,
        v: &mut impl Validate,
        props: MaterialTextureProperties,
        uv: Vec2,
        force_clamp: bool,
    ) -> Vec4 {
        let uv = uv.or_zero_if_nan();

        if force_clamp || props.flag(MaterialFlag::PointFilter) {
            self.fetch_nearest(v, props, uv, force_clamp)
        } else {
            self.fetch_bilinear(v, props, uv, force_clamp)
        }
    }

    pub fn fetch_nearest(
        &self,
        v: &mut impl Validate,
        props: MaterialTextureProperties,
        uv: Vec2,
        force_clamp: bool,
    ) -> Vec4 {
        let x = (uv.x * props.width as f32) as i32;
        let y = (uv.y * props.height as f32) as i32;

        self.texel(v, props.fetch_offset(x, y, force_clamp))
    }

    pub fn fetch_bilinear(
        &self,
        v: &mut impl Validate,
        props: MaterialTextureProperties,
        uv: Vec2,
        force_clamp: bool,
    ) -> Vec4 {
        let u = uv.x * props.width as f32 - 0.5;
        let w = uv.y * props.height as f32 - 0.5;
        let x = u.floor();
        let y = w.floor();
        let u_ratio = u - x;
        let v_ratio = w - y;

        let x0 = x as i32;
        let y0 = y as i32;
        let x1 = x0.wrapping_add(1);
        let y1 = y0.wrapping_add(1);

        let c00 = self.texel(v, props.fetch_offset(x0, y0, force_clamp));
        let c10 = self.texel(v, props.fetch_offset(x1, y0, force_clamp));
        let c01 = self.texel(v, props.fetch_offset(x0, y1, force_clamp));
        let c11 = self.texel(v, props.fetch_offset(x1, y1, force_clamp));

        (c00 * (1.0 - u_ratio) + c10 * u_ratio) * (1.0 - v_ratio)
            + (c01 * (1.0 - u_ratio) + c11 * u_ratio) * v_ratio
    }

    #[track_caller]
    fn texel(&self, v: &mut impl Validate, offset: i32) -> Vec4 {
        self.texels.get(v, offset).to_linear()
    }
}
