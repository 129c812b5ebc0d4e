//! Turns a project tree into an ordered list of packaging steps.
//!
//! Planning is pure: it reads version headers up front and then walks the
//! tree without touching the file system. The resulting steps are executed
//! in order by [`crate::bundler::Bundler`].

use super::{ProjectNode, ProjectTree};
use crate::{
    bail,
    bundler::{
        Arch, Result, Settings,
        builder::naming::{ProductVersion, expand_setup_name},
    },
};
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

/// One unit of work produced by the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedStep {
    /// Configure and build a project for one architecture.
    Build {
        project: String,
        project_dir: PathBuf,
        arch: Arch,
        install_dir: PathBuf,
        args: Vec<String>,
    },
    /// Run the install rule and copy packaging files.
    Install {
        project: String,
        project_dir: PathBuf,
        packaging_dir: PathBuf,
        archs: Vec<Arch>,
        install_dir: PathBuf,
        run_rule: bool,
    },
    /// Copy every child install dir into the composite's install dir.
    Merge {
        project: String,
        sources: Vec<PathBuf>,
        dest: PathBuf,
    },
    /// Zip an install dir.
    Archive {
        project: String,
        source: PathBuf,
        archive: PathBuf,
    },
    /// Create and sign a driver catalog.
    Catalog { project: String, install_dir: PathBuf },
    /// Create and sign a driver cabinet.
    Cabinet { project: String, install_dir: PathBuf },
    /// Take attestation signed drivers from the deployment dir.
    ExtractDrivers {
        project: String,
        reference: String,
        install_dir: PathBuf,
    },
    /// Link an installer for one architecture.
    Installer {
        project: String,
        arch: Arch,
        setup_name: String,
        install_dir: PathBuf,
        bundle: bool,
    },
    /// Sign an installer.
    Sign { file: PathBuf, bundle: bool },
    /// Copy installers to the deployment dir.
    Deploy {
        project: String,
        install_dir: PathBuf,
        bundle: bool,
    },
    /// Remove object files and libraries from a build dir.
    Clean {
        project: String,
        project_dir: PathBuf,
        arch: Arch,
    },
}

impl fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedStep::Build {
                project,
                project_dir,
                arch,
                install_dir,
                args,
            } => {
                write!(
                    f,
                    "build {project} ({arch}) in {} -> {}",
                    project_dir.display(),
                    install_dir.display()
                )?;
                if !args.is_empty() {
                    write!(f, " [{}]", args.join(" "))?;
                }
                Ok(())
            }
            PlannedStep::Install {
                project,
                archs,
                install_dir,
                run_rule,
                ..
            } => {
                let archs: Vec<&str> = archs.iter().map(|a| a.as_str()).collect();
                write!(
                    f,
                    "install {project} ({}) -> {}{}",
                    archs.join(", "),
                    install_dir.display(),
                    if *run_rule { "" } else { " (files only)" }
                )
            }
            PlannedStep::Merge {
                project,
                sources,
                dest,
            } => write!(
                f,
                "merge {} install dirs into {project} at {}",
                sources.len(),
                dest.display()
            ),
            PlannedStep::Archive {
                project, archive, ..
            } => write!(f, "archive {project} -> {}", archive.display()),
            PlannedStep::Catalog { project, .. } => write!(f, "catalog {project}.cat"),
            PlannedStep::Cabinet { project, .. } => write!(f, "cabinet {project}.cab"),
            PlannedStep::ExtractDrivers {
                project, reference, ..
            } => write!(f, "extract signed drivers {reference} for {project}"),
            PlannedStep::Installer {
                project,
                arch,
                setup_name,
                bundle,
                ..
            } => write!(
                f,
                "{} {setup_name} for {project} ({arch})",
                if *bundle { "bundle" } else { "msi" }
            ),
            PlannedStep::Sign { file, bundle } => write!(
                f,
                "sign {}{}",
                file.display(),
                if *bundle { " (bundle)" } else { "" }
            ),
            PlannedStep::Deploy { project, .. } => write!(f, "deploy {project}"),
            PlannedStep::Clean {
                project,
                project_dir,
                arch,
            } => write!(f, "clean {project} ({arch}) in {}", project_dir.display()),
        }
    }
}

impl PlannedStep {
    /// Short step kind, used in progress output.
    pub fn kind(&self) -> &'static str {
        match self {
            PlannedStep::Build { .. } => "build",
            PlannedStep::Install { .. } => "install",
            PlannedStep::Merge { .. } => "merge",
            PlannedStep::Archive { .. } => "archive",
            PlannedStep::Catalog { .. } => "catalog",
            PlannedStep::Cabinet { .. } => "cabinet",
            PlannedStep::ExtractDrivers { .. } => "extract",
            PlannedStep::Installer { .. } => "installer",
            PlannedStep::Sign { .. } => "sign",
            PlannedStep::Deploy { .. } => "deploy",
            PlannedStep::Clean { .. } => "clean",
        }
    }
}

/// Plans a run of `settings` over `tree`.
pub struct Planner<'a> {
    settings: &'a Settings,
    tree: &'a ProjectTree,
    versions: HashMap<PathBuf, ProductVersion>,
}

impl<'a> Planner<'a> {
    /// Validates the tree and reads the version headers of every project
    /// reachable from the package.
    ///
    /// A missing header fails the run, except in dry runs where the
    /// `%VERSION%` placeholder is left as is.
    pub async fn new(settings: &'a Settings, tree: &'a ProjectTree) -> Result<Self> {
        tree.validate()?;

        let mut versions = HashMap::new();
        for name in reachable(tree, settings.package_name(), settings.arch()) {
            let Some(file) = tree.get(name).and_then(|n| n.version_file.as_ref()) else {
                continue;
            };
            let path = settings.workspace().join(file);
            if versions.contains_key(&path) {
                continue;
            }
            match ProductVersion::read_header(&path).await {
                Ok(version) => {
                    versions.insert(path, version);
                }
                Err(e) if settings.dry_run() => {
                    log::warn!("{name}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            settings,
            tree,
            versions,
        })
    }

    /// Plans the whole run.
    pub fn plan(&self) -> Result<Vec<PlannedStep>> {
        let package = self.settings.package_name();
        let mut steps = Vec::new();

        if self.tree.contains(package) {
            self.walk(package, &mut steps);
            if !self.settings.skip().clean {
                self.plan_clean(package, &mut steps);
            }
        } else {
            log::info!("{package} is not in the project tree, building the package path directly");
            self.plan_unconfigured(&mut steps)?;
        }
        Ok(steps)
    }

    fn walk(&self, name: &str, steps: &mut Vec<PlannedStep>) {
        let Some(node) = self.tree.get(name) else {
            return;
        };
        let run_arch = self.settings.arch();
        let skip = self.settings.skip();
        let children = node.children(run_arch);

        if children.is_empty() {
            self.plan_build(name, node, steps);
            if node.install {
                self.plan_install(name, node, steps);
            }
            self.plan_archive(name, node, steps);
            if node.extract {
                self.plan_extract(name, node, steps);
            }
        } else {
            for child in children {
                self.walk(child, steps);
            }
            if node.install {
                self.plan_install(name, node, steps);
            }
            if node.msi && !skip.merge {
                steps.push(PlannedStep::Merge {
                    project: name.to_string(),
                    sources: children
                        .iter()
                        .map(|child| {
                            let dir = self.tree.get(child).and_then(|c| c.install_dir.as_deref());
                            self.settings.install_dir_for(child, dir)
                        })
                        .collect(),
                    dest: self.install_dir(name, node),
                });
            }
            self.plan_archive(name, node, steps);
            if node.catalog && !node.skip_catalog && !skip.catalog {
                steps.push(PlannedStep::Catalog {
                    project: name.to_string(),
                    install_dir: self.install_dir(name, node),
                });
            }
            if node.cabinet && !node.skip_cabinet && !skip.cabinet {
                steps.push(PlannedStep::Cabinet {
                    project: name.to_string(),
                    install_dir: self.install_dir(name, node),
                });
            }
            if node.extract {
                self.plan_extract(name, node, steps);
            }
        }

        if node.msi {
            self.plan_delivery(name, node, steps);
        }
    }

    fn plan_build(&self, name: &str, node: &ProjectNode, steps: &mut Vec<PlannedStep>) {
        let Some(project_dir) = &node.project_dir else {
            log::debug!("{name}: no project_dir, nothing to build");
            return;
        };
        if node.skip_build || self.settings.skip().build {
            log::debug!("{name}: build skipped");
            return;
        }
        for arch in node.archs(self.settings.arch()) {
            steps.push(PlannedStep::Build {
                project: name.to_string(),
                project_dir: self.settings.workspace().join(project_dir),
                arch,
                install_dir: self.install_dir(name, node),
                args: node.args.clone(),
            });
        }
    }

    fn plan_install(&self, name: &str, node: &ProjectNode, steps: &mut Vec<PlannedStep>) {
        let skip = self.settings.skip();
        let Some(project_dir) = &node.project_dir else {
            log::debug!("{name}: no project_dir, nothing to install");
            return;
        };
        if node.skip_install || skip.install {
            log::debug!("{name}: install skipped");
            return;
        }
        steps.push(PlannedStep::Install {
            project: name.to_string(),
            project_dir: self.settings.workspace().join(project_dir),
            packaging_dir: self.settings.package_base_dir().join(project_dir),
            archs: node.archs(self.settings.arch()),
            install_dir: self.install_dir(name, node),
            run_rule: !(node.bundle || node.skip_msbuild_install || skip.msbuild_install),
        });
    }

    fn plan_archive(&self, name: &str, node: &ProjectNode, steps: &mut Vec<PlannedStep>) {
        let Some(archive) = self.settings.create_zip() else {
            return;
        };
        steps.push(PlannedStep::Archive {
            project: name.to_string(),
            source: self.install_dir(name, node),
            archive: archive_path(archive, name),
        });
    }

    fn plan_extract(&self, name: &str, node: &ProjectNode, steps: &mut Vec<PlannedStep>) {
        steps.push(PlannedStep::ExtractDrivers {
            project: name.to_string(),
            reference: node.reference_name(name).to_string(),
            install_dir: self.install_dir(name, node),
        });
    }

    /// Installer, signing and deployment of an `msi` project.
    fn plan_delivery(&self, name: &str, node: &ProjectNode, steps: &mut Vec<PlannedStep>) {
        let skip = self.settings.skip();
        let install_dir = self.install_dir(name, node);
        let archs = node.archs(self.settings.arch());

        if !node.skip_msi && !skip.msi {
            for &arch in &archs {
                steps.push(PlannedStep::Installer {
                    project: name.to_string(),
                    arch,
                    setup_name: self.setup_name(name, node, arch),
                    install_dir: install_dir.clone(),
                    bundle: node.bundle,
                });
            }
        }
        if !skip.sign {
            for &arch in &archs {
                steps.push(PlannedStep::Sign {
                    file: install_dir.join(self.setup_name(name, node, arch)),
                    bundle: node.bundle,
                });
            }
        }
        if !skip.deploy {
            steps.push(PlannedStep::Deploy {
                project: name.to_string(),
                install_dir,
                bundle: node.bundle,
            });
        }
    }

    fn plan_clean(&self, name: &str, steps: &mut Vec<PlannedStep>) {
        let Some(node) = self.tree.get(name) else {
            return;
        };
        let run_arch = self.settings.arch();
        if node.is_composite(run_arch) {
            for child in node.children(run_arch) {
                self.plan_clean(child, steps);
            }
            return;
        }
        let Some(project_dir) = &node.project_dir else {
            return;
        };
        if node.skip_clean {
            return;
        }
        for arch in node.archs(run_arch) {
            steps.push(PlannedStep::Clean {
                project: name.to_string(),
                project_dir: self.settings.workspace().join(project_dir),
                arch,
            });
        }
    }

    /// A package that is not in the tree: build and package its path as is.
    fn plan_unconfigured(&self, steps: &mut Vec<PlannedStep>) -> Result<()> {
        let settings = self.settings;
        let skip = settings.skip();
        let name = settings.package_name();
        let arch = settings.arch();
        let install_dir = settings.install_dir_for(name, None);
        let project_dir = settings.workspace().join(settings.package_path());

        if !skip.build {
            steps.push(PlannedStep::Build {
                project: name.to_string(),
                project_dir: project_dir.clone(),
                arch,
                install_dir: install_dir.clone(),
                args: Vec::new(),
            });
        }
        if !skip.install {
            steps.push(PlannedStep::Install {
                project: name.to_string(),
                project_dir,
                packaging_dir: settings.package_base_dir().join(settings.package_path()),
                archs: vec![arch],
                install_dir: install_dir.clone(),
                run_rule: !skip.msbuild_install,
            });
        }
        if !skip.msi {
            let Some(template) = settings.setup_name() else {
                bail!("{name} is not in the project tree and no setup name was given");
            };
            steps.push(PlannedStep::Installer {
                project: name.to_string(),
                arch,
                setup_name: expand_setup_name(template, arch, None),
                install_dir: install_dir.clone(),
                bundle: false,
            });
        }
        if !skip.deploy {
            steps.push(PlannedStep::Deploy {
                project: name.to_string(),
                install_dir,
                bundle: false,
            });
        }
        Ok(())
    }

    fn install_dir(&self, name: &str, node: &ProjectNode) -> PathBuf {
        self.settings
            .install_dir_for(name, node.install_dir.as_deref())
    }

    /// Installer file name of `name` on `arch`.
    pub fn setup_name(&self, name: &str, node: &ProjectNode, arch: Arch) -> String {
        let template = self.settings.setup_name().or(node.setup_name.as_deref());
        let Some(template) = template else {
            return name.to_string();
        };
        let version = node
            .version_file
            .as_ref()
            .and_then(|file| self.versions.get(&self.settings.workspace().join(file)))
            .map(|v| v.with_revision(self.settings.revision()));
        expand_setup_name(template, arch, version.as_deref())
    }
}

/// Archive file for `project`: the given file, or `<project>.zip` inside
/// the given directory.
fn archive_path(archive: &Path, project: &str) -> PathBuf {
    if archive.is_dir() {
        archive.join(format!("{project}.zip"))
    } else {
        archive.to_path_buf()
    }
}

/// Projects below `root` on `run_arch`, root first.
fn reachable<'t>(tree: &'t ProjectTree, root: &'t str, run_arch: Arch) -> Vec<&'t str> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(name) = stack.pop() {
        if out.contains(&name) {
            continue;
        }
        let Some(node) = tree.get(name) else {
            continue;
        };
        out.push(name);
        stack.extend(node.children(run_arch).iter().rev().map(String::as_str));
    }
    out
}
