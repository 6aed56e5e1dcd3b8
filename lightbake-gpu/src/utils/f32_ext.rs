pub trait F32Ext
where
    Self: Sized,
{
    fn saturate(self) -> Self;

    /// Returns `1.0` for zeros (both of them) and positive numbers, `-1.0`
    /// otherwise.
    fn sign_not_zero(self) -> Self;
}

impl F32Ext for f32 {
    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn sign_not_zero(self) -> Self {
        if self >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }
}
