use glam::{vec2, Vec2};

use crate::F32Ext;

pub trait Vec2Ext
where
    Self: Sized,
{
    /// Component-wise [`F32Ext::sign_not_zero()`].
    fn sign_not_zero(self) -> Self;

    /// Replaces this vector with zero if any of its components is NaN.
    fn or_zero_if_nan(self) -> Self;
}

impl Vec2Ext for Vec2 {
    fn sign_not_zero(self) -> Self {
        vec2(self.x.sign_not_zero(), self.y.sign_not_zero())
    }

    fn or_zero_if_nan(self) -> Self {
        if self.is_nan() {
            Vec2::ZERO
        } else {
            self
        }
    }
}
