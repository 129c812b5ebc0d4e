//! Build and packaging library.
//!
//! The library drives the external tools a native product is packaged with:
//! CMake and the native build tools, the Qt runtime deployment, the WiX
//! toolset, the code signing command and the driver catalog tools. A JSON
//! [`ProjectTree`] describes how projects are composed; [`Bundler`] plans a
//! run over it and executes the steps.
//!
//! # Module Organization
//!
//! - [`builder`] - run orchestration and packaging primitives
//! - [`cmake`] - generator selection, configure and build
//! - [`project`] - the project tree and the run planner
//! - [`qt`] - Qt runtime deployment tables
//! - [`platform`] - WiX, signing and driver packages
//! - [`settings`] - run configuration
//! - [`utils`] - file system and process helpers

pub mod builder;
pub mod cmake;
pub mod error;
pub mod platform;
pub mod project;
pub mod qt;
pub mod settings;
pub mod utils;

pub use builder::Bundler;
pub use error::{Error, Result};
pub use project::{PlannedStep, ProjectNode, ProjectTree};
pub use settings::{
    Arch, ArchSpec, BuildType, DEFAULT_SIGN_COMMAND, Settings, SettingsBuilder, SkipFlags,
    ToolSettings, VsVersion,
};

use std::path::PathBuf;

/// An installer created by a run.
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Project the installer belongs to
    pub project: String,
    /// Installer path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex SHA-256
    pub checksum: String,
}
