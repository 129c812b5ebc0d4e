//! `build` and `tree`: runs over the project tree.

use super::CommandContext;
use crate::bundler::{Bundler, Error, ProjectTree, SettingsBuilder, SkipFlags};
use crate::cli::args::{BuildArgs, TreeArgs};
use crate::error::Result;
use std::path::Path;

/// Loads the project tree, or an empty one when the file does not exist.
///
/// Packages missing from the tree are built directly from their path.
pub async fn load_tree(ctx: &CommandContext) -> Result<ProjectTree> {
    let path = ctx.tools.project_tree_path(&ctx.workspace);
    if !path.is_file() {
        log::warn!("Project tree {} not found, only unconfigured packages can be built", path.display());
        return Ok(ProjectTree::default());
    }
    log::debug!("Reading project tree {}", path.display());
    Ok(ProjectTree::load(&path).await?)
}

fn package_name(package_path: &Path) -> Result<String> {
    package_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::GenericError(format!("package path {} has no name", package_path.display())).into()
        })
}

pub async fn execute(args: &BuildArgs, ctx: &CommandContext) -> Result<i32> {
    let mut builder = SettingsBuilder::new()
        .workspace(&ctx.workspace)
        .package_path(&args.package_path)
        .setup_name(args.setup_name.clone())
        .arch(args.arch)
        .build_type(args.build_type)
        .revision(args.rev.clone())
        .defines(args.defines.clone())
        .install_prefix(&args.install_prefix)
        .build_dir(args.build_dir.clone())
        .deployment_dir(args.deploy_to.clone())
        .create_zip(args.create_zip.clone())
        .skip(SkipFlags::from(&args.skip))
        .sign(args.sign)
        .toolset(args.toolset.clone())
        .clean_cache(!args.no_clean_cache)
        .dry_run(args.dry)
        .tools(ctx.tools.clone());
    if let Some(base) = &args.package_base_dir {
        builder = builder.package_base_dir(ctx.workspace.join(base));
    }
    if let Some(vs) = args.vs_version {
        builder = builder.vs_version(vs);
    }
    let settings = builder.build()?;

    let tree = load_tree(ctx).await?;
    if args.show_tree {
        ctx.config
            .output()
            .plain(&tree.render(settings.package_name(), settings.arch()))?;
    }

    let bundler = Bundler::new(settings, tree);
    if bundler.is_ignored() {
        ctx.config.success(&format!(
            "{} is marked as ignored, nothing to do",
            bundler.settings().package_name()
        ))?;
        return Ok(0);
    }

    let settings = bundler.settings();
    ctx.config.section(&format!(
        "Building {} ({}, {}, revision {})",
        settings.package_name(),
        settings.arch(),
        settings.build_type(),
        settings.revision()
    ))?;
    let skipped = settings.skip().skipped_names();
    if !skipped.is_empty() {
        ctx.config
            .verbose_println(&format!("   Skipping: {}", skipped.join(", ")))?;
    }

    let artifacts = bundler.run().await?;

    for artifact in &artifacts {
        ctx.config.success(&format!(
            "✓ {} ({} bytes)",
            artifact.path.display(),
            artifact.size
        ))?;
        ctx.config.indent(&format!("sha256 {}", artifact.checksum))?;
    }
    ctx.config
        .success(&format!("Finished {}", settings.package_name()))?;
    Ok(0)
}

/// Prints the tree below a package.
pub async fn tree(args: &TreeArgs, ctx: &CommandContext) -> Result<i32> {
    let name = package_name(&args.package_path)?;
    let tree = load_tree(ctx).await?;
    tree.validate()?;
    if !tree.contains(&name) {
        return Err(Error::UnknownProject(name).into());
    }
    ctx.config.output().plain(&tree.render(&name, args.arch))?;
    Ok(0)
}
