//! Error types for the command line layer.
//!
//! Library failures arrive as [`crate::bundler::Error`] and are wrapped here
//! together with argument and configuration errors, each with recovery
//! suggestions that `main` prints below the message.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for command line operations
pub type Result<T> = std::result::Result<T, PacktreeError>;

/// Main error type of the `packtree` binary
#[derive(Error, Debug)]
pub enum PacktreeError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Packaging errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// The tool configuration file could not be used
    #[error("Invalid tool configuration {}: {reason}", .path.display())]
    InvalidConfig {
        /// Configuration file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl PacktreeError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error as B;

        match self {
            PacktreeError::Cli(CliError::InvalidConfig { path, .. }) => vec![format!(
                "Fix or remove {} ([tools] and [paths] tables only)",
                path.display()
            )],
            PacktreeError::Cli(CliError::MissingArgument { argument }) => {
                vec![format!("Pass {argument}, see `packtree help`")]
            }
            PacktreeError::Bundler(B::ToolNotFound { tool, .. }) => vec![
                format!("Install {tool} or add its path to the [tools] table of packtree.toml"),
                "Run with -v to see where tools were looked for".to_string(),
            ],
            PacktreeError::Bundler(B::UnknownProject(name)) => vec![format!(
                "Add `{name}` to the project tree or remove it from every project_list"
            )],
            PacktreeError::Bundler(B::ProjectCycle(_)) => {
                vec!["A project must not list itself directly or through its children".to_string()]
            }
            PacktreeError::Bundler(B::NotBuildDir(_)) => vec![
                "Run from a directory whose name contains `build` or pass --builddir".to_string(),
            ],
            PacktreeError::Bundler(B::ToolFailed { .. }) => {
                vec!["Check the tool output above for the cause".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
