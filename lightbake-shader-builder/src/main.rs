//! Compiles `lightbake-shaders` into a single SPIR-V module.
//!
//! Usage: `lightbake-shader-builder [output.spv]`; the module is written to
//! `lightbake-shaders.spv` when no path is given. The resulting file is what
//! `lightbake::GpuExecutor` expects.

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use spirv_builder::{MetadataPrintout, SpirvBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let output = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lightbake-shaders.spv"));

    let crate_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("couldn't find workspace root")?
        .join("lightbake-shaders");

    let result = SpirvBuilder::new(crate_path, "spirv-unknown-spv1.3")
        .multimodule(false)
        .print_metadata(MetadataPrintout::None)
        .extra_arg("--spirt-passes=reduce,fuse_selects")
        .build()?;

    fs::copy(result.module.unwrap_single(), &output)?;

    for entry_point in &result.entry_points {
        println!("{}", entry_point);
    }

    println!("-> {}", output.display());

    Ok(())
}
