//! CMake configure and native build driver.
//!
//! Picks a generator for the host, derives the Visual Studio toolset and
//! platform arguments, configures one build directory per architecture and
//! builds it with MSBuild or `cmake --build`.

mod build_dir;
mod driver;
mod generator;
mod version;

pub use build_dir::{BuildDir, build_dir_name};
pub use driver::{CMakeDriver, CMakeRequest};
pub use generator::{
    Generator, GeneratorFlavor, HostPlatform, toolset_arg, vs_arch_args, vs_generator_name,
};
pub use version::CMakeVersion;
