//! Command line interface for packtree.
//!
//! Resolves the workspace and the tool configuration, then dispatches to the
//! subcommand in [`commands`].

mod args;
pub mod commands;
mod output;

pub use args::{
    Args, BuildArgs, CMakeArgs, Command, DeployQtArgs, MsiArgs, RuntimeConfig, SignArgs,
    SkipArgs, TreeArgs, VersionWxiArgs, VersionizeArgs,
};
pub use output::OutputManager;

use crate::config::ToolConfig;
use crate::error::{CliError, Result};
use crate::source::WorkspaceSource;
use commands::CommandContext;

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(&args);
    let workspace = WorkspaceSource::new(args.workspace.clone())?.resolve()?;
    config.verbose_println(&format!("   Workspace: {}", workspace.display()))?;

    let tools = ToolConfig::discover(&workspace, args.tool_config.as_deref())?
        .into_tool_settings(&workspace);
    let ctx = CommandContext {
        workspace,
        tools,
        config,
    };

    match &args.command {
        Command::Build(build) => commands::build::execute(build, &ctx).await,
        Command::Tree(tree) => commands::build::tree(tree, &ctx).await,
        Command::Cmake(cmake) => commands::cmake::execute(cmake, &ctx).await,
        Command::DeployQt(qt) => commands::qt::execute(qt, &ctx).await,
        Command::Msi(msi) => commands::msi::execute(msi, &ctx).await,
        Command::Sign(sign) => commands::sign::execute(sign, &ctx).await,
        Command::Versionize(v) => commands::version::versionize_file(v, &ctx).await,
        Command::VersionWxi(v) => commands::version::version_wxi(v, &ctx).await,
    }
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}
