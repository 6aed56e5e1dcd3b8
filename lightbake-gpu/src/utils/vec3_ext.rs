use glam::{vec3, Vec3};

/// Normals shorter than this are treated as absent.
const MIN_NORMAL_LENGTH_SQUARED: f32 = 1e-8;

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Returns luminance of this color-vector.
    fn luminance(self) -> f32;

    /// Returns whether this vector can be used as a surface normal; probes and
    /// other normal-less samples carry a zero vector here.
    fn is_valid_normal(self) -> bool;
}

impl Vec3Ext for Vec3 {
    fn luminance(self) -> f32 {
        self.dot(vec3(0.22, 0.707, 0.071))
    }

    fn is_valid_normal(self) -> bool {
        self.length_squared() > MIN_NORMAL_LENGTH_SQUARED
    }
}
