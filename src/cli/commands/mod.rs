//! Subcommand implementations.
//!
//! Every command receives the resolved [`CommandContext`] and returns the
//! process exit code.

pub mod build;
pub mod cmake;
pub mod msi;
pub mod qt;
pub mod sign;
pub mod version;

use super::RuntimeConfig;
use crate::bundler::ToolSettings;
use std::path::PathBuf;

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Absolute workspace root
    pub workspace: PathBuf,
    /// Tool locations from the configuration file
    pub tools: ToolSettings,
    pub config: RuntimeConfig,
}
