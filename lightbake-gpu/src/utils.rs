mod f32_ext;
mod u32_ext;
mod vec2_ext;
mod vec3_ext;

pub use self::f32_ext::*;
pub use self::u32_ext::*;
pub use self::vec2_ext::*;
pub use self::vec3_ext::*;
