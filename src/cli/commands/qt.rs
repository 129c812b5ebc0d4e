//! `deploy-qt`: copy the Qt runtime next to an application.

use super::CommandContext;
use crate::bundler::qt::{ModulePreset, QtDeployment, QtPlatform};
use crate::cli::args::DeployQtArgs;
use crate::error::Result;
use path_absolutize::Absolutize;

/// Requested modules, preset modules first.
fn modules(args: &DeployQtArgs) -> Vec<String> {
    let preset = match args.preset.as_deref() {
        Some("gui") => ModulePreset::Gui.modules(),
        Some("full") => ModulePreset::Full.modules(),
        _ => &[],
    };
    let mut modules: Vec<String> = preset.iter().map(|m| m.to_string()).collect();
    for module in &args.modules {
        if !modules.contains(module) {
            modules.push(module.clone());
        }
    }
    modules
}

pub async fn execute(args: &DeployQtArgs, ctx: &CommandContext) -> Result<i32> {
    let qt_dir = match &args.qt_directory {
        Some(dir) => dir.clone(),
        None => ctx.tools.qt_dir(&ctx.workspace),
    };

    let deployment = QtDeployment {
        release: args.qt_version,
        platform: QtPlatform::current(),
        arch: args.arch,
        build_type: args.build_type,
        modules: modules(args),
        special_build: args.special_build.clone(),
        qt_dir,
        destination: args.destination.absolutize()?.into_owned(),
        dry_run: args.dry,
    };

    ctx.config.section(&format!(
        "Deploying Qt {} to {}",
        deployment.release.name(),
        deployment.destination.display()
    ))?;
    let items = deployment.run().await?;
    if !args.dry {
        ctx.config
            .success(&format!("✓ Deployed {} Qt runtime files", items.len()))?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Args, Command};
    use clap::Parser;

    #[test]
    fn preset_modules_come_first_without_repeats() {
        let args = Args::try_parse_from([
            "packtree", "deploy-qt", "--destination", "out", "--preset", "gui", "--qt-module",
            "network", "--qt-module", "xml",
        ])
        .unwrap();
        let Command::DeployQt(args) = args.command else {
            panic!("expected deploy-qt");
        };
        assert_eq!(modules(&args), ["widgets", "quick2", "network", "xml"]);
    }
}
