//! Compute kernels shared by lightbake's accelerator shaders and its CPU
//! reference executor.
//!
//! Everything in here must compile both for `spirv-unknown-*` (through
//! rust-gpu) and for the host, so no allocation, no panics on the hot path
//! and every buffer access goes through [`BufferView`] & co.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod buffer_id;
mod color;
mod convergence;
mod environment;
mod fault;
mod geometry;
mod hit;
pub mod kernels;
mod light;
mod material;
mod normal;
mod passes;
mod ray;
mod rgbm;
mod sampling;
mod sh;
mod texture;
mod utils;
mod validate;
mod views;

pub use self::buffer_id::*;
pub use self::color::*;
pub use self::convergence::*;
pub use self::environment::*;
pub use self::fault::*;
pub use self::geometry::*;
pub use self::hit::*;
pub use self::light::*;
pub use self::material::*;
pub use self::normal::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::rgbm::*;
pub use self::sampling::*;
pub use self::sh::*;
pub use self::texture::*;
pub use self::utils::*;
pub use self::validate::*;
pub use self::views::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::spirv;

    pub use crate::*;
}

/// Number of work-items in a single workgroup of every lightbake kernel.
pub const WORKGROUP_SIZE: u32 = 64;

/// Smallest positive value such that `1.0 + FLT_EPSILON != 1.0`.
pub const FLT_EPSILON: f32 = 1.192_092_9e-7;
