//! Host side of lightbake: scene upload, configuration and executors running
//! the lightmap-baking kernels either on the CPU or on the accelerator.
//!
//! Kernels never fail; invalid accesses and broken invariants are recorded
//! as faults (when [`Validation::Enabled`]) and have to be polled through
//! [`Executor::take_fault()`] after each operation.

mod capacities;
mod config;
mod cpu;
mod error;
mod executor;
mod fault;
mod gpu;
mod scene;

pub use lightbake_gpu;

pub use self::capacities::*;
pub use self::config::*;
pub use self::cpu::*;
pub use self::error::*;
pub use self::executor::*;
pub use self::fault::*;
pub use self::gpu::GpuExecutor;
pub use self::scene::*;
