//! Accelerator entry points of lightbake's kernels.
//!
//! Every kernel comes in two flavours: `main` runs without validation, while
//! `main_checked` expects the per-buffer capacity table at binding 0 and the
//! fault record at binding 1. The remaining bindings are shared by both.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::too_many_arguments)]

pub mod accumulate_probe_sh;
pub mod convergence;
pub mod encode_rgbm;
pub mod final_gather;
pub mod prepare_shadow_rays;
pub mod resolve_hits;
pub mod shade_direct;
