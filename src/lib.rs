//! Build and packaging driver for native products
//!
//! This library drives the external tools a native product is released
//! with, glued together by a JSON project tree:
//! - CMake configure and native builds (MSBuild, make, Ninja, JOM, Xcode)
//! - Qt runtime deployment
//! - WiX installers, code signing and driver catalogs/cabinets
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use error::{CliError, PacktreeError, Result};
