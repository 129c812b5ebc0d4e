//! Configuration structures for packaging runs.
//!
//! [`Settings`] holds everything a run needs: the package to build, the
//! target architecture and build type, the output locations, skip switches
//! and tool overrides. It is constructed through [`SettingsBuilder`].

mod arch;
mod build_type;
mod builder;
mod core;
mod skip;
mod tools;

pub use arch::{Arch, ArchSpec};
pub use build_type::{BuildType, VsVersion};
pub use builder::SettingsBuilder;
pub use core::Settings;
pub use skip::SkipFlags;
pub use tools::{DEFAULT_SIGN_COMMAND, ToolSettings};
