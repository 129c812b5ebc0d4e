//! Copy the Qt runtime next to an application.

use super::{
    release::{DEFAULT_MODULES, MODULES, QtRelease},
    table::{QtPlatform, uses_module},
};
use crate::{
    bail,
    bundler::{
        Arch, BuildType, Result,
        error::ErrorExt,
        utils::{
            ToolCommand,
            fs::{copy_file, copy_tree, create_dir_all},
        },
    },
};
use std::path::{Path, PathBuf};

/// Named module selections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModulePreset {
    /// Desktop GUI application
    Gui,
    /// Everything the full product uses
    Full,
}

impl ModulePreset {
    /// Modules of the preset.
    pub fn modules(self) -> &'static [&'static str] {
        match self {
            ModulePreset::Gui => &["widgets", "quick2", "network"],
            ModulePreset::Full => &[
                "multimedia",
                "network",
                "print",
                "quick2",
                "widgets",
                "xml",
                "positioning",
                "location",
            ],
        }
    }
}

/// Final module list.
///
/// No selection means the default modules. An `angle` special build with
/// `quick2` selected pulls in `angle`. Unknown module names are rejected.
pub fn select_modules(requested: &[String], special_build: Option<&str>) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(DEFAULT_MODULES.iter().map(|m| m.to_string()).collect());
    }

    let mut modules: Vec<String> = Vec::with_capacity(requested.len() + 1);
    for module in requested {
        if !MODULES.contains(&module.as_str()) {
            bail!(
                "unknown Qt module `{module}` (expected one of {})",
                MODULES.join(", ")
            );
        }
        if !modules.contains(module) {
            modules.push(module.clone());
        }
    }

    let has = |m: &str| modules.iter().any(|s| s == m);
    if special_build == Some("angle") && !has("angle") && has("quick2") {
        modules.push("angle".to_string());
    }
    Ok(modules)
}

/// One file or directory to deploy, relative to the Qt build and the
/// destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployItem {
    /// Path below the Qt build directory
    pub source: PathBuf,
    /// Path below the destination
    pub dest: PathBuf,
}

impl DeployItem {
    fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// Everything a release ships for the given selection.
///
/// File entries with patterns are expanded by scanning `qt_build_dir`.
pub fn deploy_items(
    release: QtRelease,
    platform: QtPlatform,
    arch: Arch,
    debug: bool,
    modules: &[String],
    qt_build_dir: &Path,
) -> Result<Vec<DeployItem>> {
    let mut items: Vec<DeployItem> = release
        .dlls(platform)
        .iter()
        .filter(|dll| uses_module(dll.modules, modules) && dll.is_required(platform, arch))
        .map(|dll| {
            let (source, dest) = dll.file_paths(platform, debug);
            DeployItem::new(source, dest)
        })
        .collect();

    for file in release.files() {
        if !uses_module(file.modules, modules) {
            continue;
        }
        if file.patterns.is_empty() {
            items.push(DeployItem::new(
                Path::new(file.source_dir).join(file.base_name),
                file.base_name,
            ));
        } else {
            items.extend(scan(
                qt_build_dir,
                file.source_dir,
                file.base_name,
                file.patterns,
                file.recursive,
            )?);
        }
    }

    if uses_module(&["quick1", "quick2"], modules) {
        items.push(DeployItem::new("qml/QtQuick", "QtQuick"));
    }
    if uses_module(&["test"], modules) {
        items.push(DeployItem::new("qml/QtTest", "QtTest"));
    }
    Ok(items)
}

fn scan(
    qt_build_dir: &Path,
    source_dir: &str,
    base_name: &str,
    patterns: &[&str],
    recursive: bool,
) -> Result<Vec<DeployItem>> {
    let root = qt_build_dir.join(source_dir).join(base_name);
    let patterns = patterns
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut walker = walkdir::WalkDir::new(&root).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut items = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if patterns.iter().any(|p| p.matches(&name)) {
            let rel = Path::new(base_name).join(entry.path().strip_prefix(&root)?);
            items.push(DeployItem::new(Path::new(source_dir).join(&rel), rel));
        }
    }
    Ok(items)
}

/// A Qt deployment.
#[derive(Clone, Debug)]
pub struct QtDeployment {
    /// Qt release
    pub release: QtRelease,
    /// Target platform
    pub platform: QtPlatform,
    /// x86 or x64
    pub arch: Arch,
    /// Debug builds ship the debug libraries
    pub build_type: BuildType,
    /// Requested modules; empty means the defaults
    pub modules: Vec<String>,
    /// Special build variant such as `angle`
    pub special_build: Option<String>,
    /// Directory holding the Qt builds
    pub qt_dir: PathBuf,
    /// Target directory
    pub destination: PathBuf,
    /// List only
    pub dry_run: bool,
}

impl QtDeployment {
    /// Qt build directory for this deployment.
    pub fn build_dir(&self) -> Result<PathBuf> {
        match self
            .release
            .build_name(self.platform, self.arch, self.special_build.as_deref())
        {
            Some(name) => Ok(self.qt_dir.join(name)),
            None => bail!("no Qt {} build for {} {}", self.release, self.platform, self.arch),
        }
    }

    /// Copies the runtime and returns what was deployed.
    pub async fn run(&self) -> Result<Vec<DeployItem>> {
        let build_dir = self.build_dir()?;
        if !build_dir.is_dir() {
            bail!("Qt directory {} does not exist", build_dir.display());
        }

        let modules = select_modules(&self.modules, self.special_build.as_deref())?;
        log::info!("Selected Qt version: {}", self.release.name());
        log::info!("Selected modules: {}", modules.join(", "));

        let items = deploy_items(
            self.release,
            self.platform,
            self.arch,
            self.build_type.is_debug(),
            &modules,
            &build_dir,
        )?;

        if !self.dry_run {
            create_dir_all(&self.destination, false).await?;
        }

        for item in &items {
            let from = build_dir.join(&item.source);
            let to = self.destination.join(&item.dest);
            if self.dry_run {
                println!("deploy {} => {}", from.display(), to.display());
                continue;
            }
            deploy_path(&from, &to).await?;
        }

        if self.platform == QtPlatform::Linux && !self.dry_run {
            let ldconfig = ToolCommand::new("ldconfig").arg("-n").arg(&self.destination);
            if let Err(e) = ldconfig.run().await {
                log::warn!("ldconfig failed: {e}");
            }
        }
        Ok(items)
    }
}

async fn deploy_path(from: &Path, to: &Path) -> Result<()> {
    if from.is_dir() {
        log::info!("deploy dir {} => {}", from.display(), to.display());
        copy_tree(from, to, |path| {
            path.to_string_lossy().ends_with(".so.debug")
        })
        .await?;
        return Ok(());
    }

    log::info!("deploy file {} => {}", from.display(), to.display());
    let metadata = tokio::fs::symlink_metadata(from)
        .await
        .fs_context("reading file metadata", from)?;
    if metadata.file_type().is_symlink() {
        let target = tokio::fs::read_link(from)
            .await
            .fs_context("reading symlink", from)?;
        let Some(target_name) = target.file_name() else {
            bail!("symlink {} has no target file name", from.display());
        };
        let source = from.parent().map(|p| p.join(&target)).unwrap_or(target.clone());
        let dest = to
            .parent()
            .map(|p| p.join(target_name))
            .unwrap_or_else(|| PathBuf::from(target_name));
        return copy_file(&source, &dest).await;
    }
    copy_file(from, to).await
}
