//! Main packaging orchestration.
//!
//! This module provides the [`Bundler`], which plans a run over the project
//! tree and executes the planned steps in order, stopping at the first
//! failure.

use super::{archive::zip_dir, checksum::digest, install::CopyRule};
use crate::{
    bail,
    bundler::{
        BundledArtifact, Result, Settings,
        cmake::{BuildDir, CMakeDriver, CMakeRequest},
        platform::windows::{
            DriverPackager, SignKind, Signer, WixLinker, WixRequest, wix::DEFAULT_RUNTIME,
        },
        project::{PlannedStep, Planner, ProjectTree},
        utils::fs::{copy_tree, create_dir_all},
    },
};
use std::path::Path;

/// Main packaging orchestrator.
///
/// Owns the run [`Settings`] and the [`ProjectTree`]. [`Bundler::run`]
/// builds, installs, packages, signs and deploys the configured package
/// and reports the installers it created.
///
/// # Examples
///
/// ```no_run
/// use packtree::bundler::{Bundler, ProjectTree, SettingsBuilder};
///
/// # async fn example() -> packtree::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .workspace("/src/product")
///     .package_path("suite")
///     .install_prefix("/src/product/tmp/build_dir")
///     .build()?;
/// let tree = ProjectTree::load(&settings.tools().project_tree_path(settings.workspace())).await?;
///
/// for artifact in Bundler::new(settings, tree).run().await? {
///     println!("{} ({} bytes, sha256 {})", artifact.path.display(), artifact.size, artifact.checksum);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
    tree: ProjectTree,
    cmake: CMakeDriver,
    signer: Signer,
    drivers: DriverPackager,
}

impl Bundler {
    /// Creates a bundler for one run.
    pub fn new(settings: Settings, tree: ProjectTree) -> Self {
        let tools = settings.tools();
        let cmake = CMakeDriver::new(tools.clone(), settings.workspace());
        let signer = Signer::new(tools, false);
        let drivers = DriverPackager::new(tools, false);
        Self {
            settings,
            tree,
            cmake,
            signer,
            drivers,
        }
    }

    /// Returns a reference to the run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a reference to the project tree.
    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// Whether the package opted out through its ignore marker.
    pub fn is_ignored(&self) -> bool {
        self.settings.ignore_marker().exists()
    }

    /// Plans the run without executing anything.
    pub async fn plan(&self) -> Result<Vec<PlannedStep>> {
        Planner::new(&self.settings, &self.tree).await?.plan()
    }

    /// Plans and executes the run.
    ///
    /// Ignored packages do nothing. Dry runs execute whatever their skip
    /// switches leave planned, so forced signing still signs. Returns the
    /// installers that were linked.
    pub async fn run(&self) -> Result<Vec<BundledArtifact>> {
        if self.is_ignored() {
            log::info!(
                "{} found, skipping {}",
                self.settings.ignore_marker().display(),
                self.settings.package_name()
            );
            return Ok(Vec::new());
        }

        let steps = self.plan().await?;
        if steps.is_empty() {
            log::info!("nothing to do for {}", self.settings.package_name());
        }

        let mut artifacts = Vec::new();
        let total = steps.len();
        for (index, step) in steps.iter().enumerate() {
            log::info!("[{}/{total}] {step}", index + 1);
            if let Some(artifact) = self.execute(step).await? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }

    /// Executes one step; installer steps report their artifact.
    pub async fn execute(&self, step: &PlannedStep) -> Result<Option<BundledArtifact>> {
        let settings = &self.settings;
        match step {
            PlannedStep::Build {
                project,
                project_dir,
                arch,
                install_dir,
                args,
            } => {
                if !project_dir.is_dir() {
                    bail!("{project}: project dir {} not found", project_dir.display());
                }
                let mut defines = settings.defines().to_vec();
                defines.push(format!("CMAKE_INSTALL_PREFIX={}", install_dir.display()));
                let request = CMakeRequest {
                    project_dir: project_dir.clone(),
                    archs: vec![*arch],
                    build_types: vec![settings.build_type()],
                    vs_version: settings.vs_version().unwrap_or_default(),
                    toolset: settings.toolset().map(str::to_string),
                    build_dir: settings.build_dir().map(Path::to_path_buf),
                    clean_cache: settings.clean_cache(),
                    defines,
                    extra_args: args.clone(),
                    make: true,
                    make_fast: settings.make_fast(),
                    ..Default::default()
                };
                self.cmake.run(&request).await?;
            }
            PlannedStep::Install {
                project_dir,
                packaging_dir,
                archs,
                install_dir,
                run_rule,
                ..
            } => {
                if *run_rule {
                    for &arch in archs {
                        self.cmake
                            .install(project_dir, arch, settings.build_type(), settings.build_dir(), false)
                            .await?;
                    }
                }
                let copied = CopyRule::AllFiles.apply(packaging_dir, install_dir).await?;
                log::debug!("copied {} packaging files from {}", copied.len(), packaging_dir.display());
            }
            PlannedStep::Merge { sources, dest, .. } => {
                create_dir_all(dest, false).await?;
                for source in sources {
                    if source.is_dir() {
                        copy_tree(source, dest, |_| false).await?;
                    } else {
                        log::warn!("{} not found, nothing to merge", source.display());
                    }
                }
            }
            PlannedStep::Archive { source, archive, .. } => {
                let archive = zip_dir(source, archive).await?;
                log::info!("Created {}", archive.display());
            }
            PlannedStep::Catalog {
                project,
                install_dir,
            } => self.drivers.catalog(project, install_dir).await?,
            PlannedStep::Cabinet {
                project,
                install_dir,
            } => self.drivers.cabinet(project, install_dir).await?,
            PlannedStep::ExtractDrivers {
                reference,
                install_dir,
                ..
            } => {
                self.drivers
                    .extract(reference, install_dir, settings.deployment_dir())
                    .await?
            }
            PlannedStep::Installer {
                project,
                arch,
                setup_name,
                install_dir,
                bundle,
            } => {
                if !install_dir.is_dir() {
                    bail!("{project}: install dir {} not found", install_dir.display());
                }
                if *bundle {
                    CopyRule::Glob("*.msi".into())
                        .apply(settings.deployment_dir(), install_dir)
                        .await?;
                }
                let request = WixRequest {
                    arch: *arch,
                    revision: settings.revision().to_string(),
                    runtime_version: settings
                        .vs_version()
                        .map(|v| format!("vs{}", v.year()))
                        .unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
                    bundle: *bundle,
                    ..WixRequest::new(setup_name.as_str(), install_dir.as_path())
                };
                let installer = WixLinker::new(settings.tools(), settings.workspace())?
                    .link(&request)
                    .await?;
                let (size, checksum) = digest(&installer).await?;
                log::info!("Successfully created {setup_name}");
                return Ok(Some(BundledArtifact {
                    project: project.clone(),
                    path: installer,
                    size,
                    checksum,
                }));
            }
            PlannedStep::Sign { file, bundle } => {
                self.signer.sign_file(file, SignKind::Auto, *bundle).await?;
                log::info!("Successfully signed {}", file.display());
            }
            PlannedStep::Deploy {
                project,
                install_dir,
                bundle,
            } => {
                if !install_dir.is_dir() {
                    bail!("deploy: install dir {} of {project} missing", install_dir.display());
                }
                let deployment = settings.deployment_dir();
                let rules = if *bundle {
                    vec![CopyRule::Glob("*.exe".into())]
                } else {
                    vec![
                        CopyRule::Glob("*.msi".into()),
                        CopyRule::Glob("disk1/*.cab".into()),
                    ]
                };
                for rule in rules {
                    rule.apply(install_dir, deployment).await?;
                }
            }
            PlannedStep::Clean {
                project_dir, arch, ..
            } => {
                let dir = BuildDir::resolve(project_dir, *arch, settings.build_dir());
                let removed = dir.remove_intermediates().await?;
                log::debug!("removed {} intermediates from {}", removed.len(), dir.path().display());
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{SettingsBuilder, SkipFlags, ToolSettings};

    fn bundler(ws: &Path, package: &str, tree: &str, skip: SkipFlags) -> Bundler {
        let settings = SettingsBuilder::new()
            .workspace(ws)
            .package_path(package)
            .package_base_dir(ws.join("packaging"))
            .install_prefix(ws.join("install"))
            .deployment_dir(Some(ws.join("PKGS")))
            .skip(skip)
            .build()
            .unwrap();
        Bundler::new(settings, ProjectTree::from_json_str(tree).unwrap())
    }

    fn only(kinds: &[&str]) -> SkipFlags {
        let mut skip = SkipFlags::all();
        for kind in kinds {
            match *kind {
                "install" => skip.install = false,
                "merge" => skip.merge = false,
                "deploy" => skip.deploy = false,
                "clean" => skip.clean = false,
                _ => {}
            }
        }
        skip.msbuild_install = true;
        skip
    }

    #[tokio::test]
    async fn ignore_marker_stops_the_run() {
        let ws = tempfile::tempdir().unwrap();
        let bundler = bundler(ws.path(), "suite", "{}", SkipFlags::default());
        std::fs::create_dir_all(ws.path().join("packaging/suite")).unwrap();
        std::fs::write(ws.path().join("packaging/suite/dwignore"), "").unwrap();
        assert!(bundler.is_ignored());
        assert!(bundler.run().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn install_merge_and_deploy_without_tools() {
        let ws = tempfile::tempdir().unwrap();
        let packaging = ws.path().join("packaging").join("apps").join("viewer");
        std::fs::create_dir_all(&packaging).unwrap();
        std::fs::write(packaging.join("product.wxs"), "<Wix/>").unwrap();
        std::fs::write(packaging.join("Suite.msi"), "msi").unwrap();

        let tree = r#"{
            "suite": {"project_list": ["viewer", "ghost"], "msi": true, "skip_msi": true},
            "viewer": {"project_dir": "apps/viewer", "install": true},
            "ghost": {}
        }"#;
        let bundler = bundler(
            ws.path(),
            "suite",
            tree,
            only(&["install", "merge", "deploy"]),
        );
        let artifacts = bundler.run().await.unwrap();
        assert!(artifacts.is_empty());

        let merged = ws.path().join("install").join("suite");
        assert!(merged.join("product.wxs").exists());
        assert_eq!(
            std::fs::read_to_string(ws.path().join("PKGS").join("Suite.msi")).unwrap(),
            "msi"
        );
    }

    #[tokio::test]
    async fn clean_removes_objects_from_build_dirs() {
        let ws = tempfile::tempdir().unwrap();
        let build = ws.path().join("apps").join("viewer").join("build64");
        std::fs::create_dir_all(build.join("src")).unwrap();
        std::fs::write(build.join("src").join("main.obj"), "").unwrap();
        std::fs::write(build.join("viewer.exe"), "").unwrap();

        let tree = r#"{"viewer": {"project_dir": "apps/viewer"}}"#;
        bundler(ws.path(), "viewer", tree, only(&["clean"]))
            .run()
            .await
            .unwrap();
        assert!(!build.join("src").join("main.obj").exists());
        assert!(build.join("viewer.exe").exists());
    }

    #[tokio::test]
    async fn deploy_requires_install_dir() {
        let ws = tempfile::tempdir().unwrap();
        let bundler = bundler(
            ws.path(),
            "suite",
            r#"{"suite": {"msi": true}}"#,
            SkipFlags::default(),
        );
        let err = bundler
            .execute(&PlannedStep::Deploy {
                project: "suite".into(),
                install_dir: ws.path().join("install/suite"),
                bundle: false,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dry_run_with_sign_still_signs() {
        use std::os::unix::fs::PermissionsExt;

        let ws = tempfile::tempdir().unwrap();
        let log = ws.path().join("calls.log");
        let script = ws.path().join("sign.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$2 $1\" >> {}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let install = ws.path().join("install").join("viewer");
        std::fs::create_dir_all(&install).unwrap();
        let setup = install.join("Viewer.msi");
        std::fs::write(&setup, "msi").unwrap();

        let settings = SettingsBuilder::new()
            .workspace(ws.path())
            .package_path("viewer")
            .install_prefix(ws.path().join("install"))
            .dry_run(true)
            .sign(true)
            .tools(ToolSettings {
                sign_command: Some(script),
                signtool: Some(ws.path().join("no-signtool")),
                ..Default::default()
            })
            .build()
            .unwrap();
        let tree = ProjectTree::from_json_str(
            r#"{"viewer": {"project_dir": "apps/viewer", "msi": true, "install": true,
                "setup_name": "Viewer.msi"}}"#,
        )
        .unwrap();
        let bundler = Bundler::new(settings, tree);
        let steps = bundler.plan().await.unwrap();
        assert_eq!(steps.iter().map(PlannedStep::kind).collect::<Vec<_>>(), ["sign"]);

        assert!(bundler.run().await.unwrap().is_empty());
        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.trim(), format!("msi {}", setup.display()));
    }

    #[tokio::test]
    async fn dry_run_still_merges_children() {
        let ws = tempfile::tempdir().unwrap();
        let child = ws.path().join("install").join("viewer");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(child.join("viewer.exe"), "exe").unwrap();

        let settings = SettingsBuilder::new()
            .workspace(ws.path())
            .package_path("suite")
            .install_prefix(ws.path().join("install"))
            .dry_run(true)
            .build()
            .unwrap();
        let tree = ProjectTree::from_json_str(
            r#"{"suite": {"project_list": ["viewer"], "msi": true},
                "viewer": {"project_dir": "apps/viewer"}}"#,
        )
        .unwrap();
        let bundler = Bundler::new(settings, tree);
        assert_eq!(
            bundler.plan().await.unwrap().iter().map(PlannedStep::kind).collect::<Vec<_>>(),
            ["merge"]
        );
        bundler.run().await.unwrap();
        assert!(ws.path().join("install").join("suite").join("viewer.exe").is_file());
    }
}
