//! A project entry of the project tree.

use crate::bundler::{Arch, ArchSpec, Result};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

const ARCH_LIST_PREFIX: &str = "project_list_";

/// Configuration of one named project.
///
/// A project with children is a composite: it packages what its children
/// build. A project without children is built from `project_dir`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectNode {
    /// Child projects, in build order
    pub project_list: Option<Vec<String>>,
    /// Architectures of this project; the run architecture when unset
    pub arch: Option<ArchSpec>,
    /// Run the install rule and copy packaging files
    pub install: bool,
    /// Link an installer
    pub msi: bool,
    /// The installer is a bootstrapper bundle
    pub bundle: bool,
    /// Create a signed driver catalog
    pub catalog: bool,
    /// Create a driver cabinet for attestation signing
    pub cabinet: bool,
    /// Pull attestation signed drivers out of the deployment dir
    pub extract: bool,
    /// Source directory, relative to the workspace
    pub project_dir: Option<PathBuf>,
    /// Install directory name below the install prefix
    pub install_dir: Option<PathBuf>,
    /// Extra CMake arguments
    pub args: Vec<String>,
    /// Installer file name, may contain `%ARCH%` and `%VERSION%`
    pub setup_name: Option<String>,
    /// Version header used for `%VERSION%`, relative to the workspace
    pub version_file: Option<PathBuf>,
    /// Driver name inside signed driver archives
    pub name: Option<String>,
    /// Never build
    pub skip_build: bool,
    /// Never install
    pub skip_install: bool,
    /// Copy packaging files but do not run the install rule
    pub skip_msbuild_install: bool,
    /// Never link the installer
    pub skip_msi: bool,
    /// Never create the catalog
    pub skip_catalog: bool,
    /// Never create the cabinet
    pub skip_cabinet: bool,
    /// Never clean the build dirs
    pub skip_clean: bool,

    /// Keys not covered above
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,

    /// Per-architecture child lists (`project_list_<arch>`)
    #[serde(skip)]
    pub arch_lists: HashMap<Arch, Vec<String>>,
}

impl ProjectNode {
    /// Moves `project_list_<arch>` keys out of `extra` into `arch_lists`.
    pub(super) fn collect_arch_lists(&mut self) -> Result<()> {
        let keys: Vec<String> = self
            .extra
            .keys()
            .filter(|k| k.starts_with(ARCH_LIST_PREFIX))
            .cloned()
            .collect();

        for key in keys {
            let arch: Arch = key[ARCH_LIST_PREFIX.len()..].parse()?;
            if let Some(value) = self.extra.remove(&key) {
                let list: Vec<String> = serde_json::from_value(value)?;
                self.arch_lists.insert(arch, list);
            }
        }
        Ok(())
    }

    /// Children for a run on `run_arch`; the arch specific list wins.
    pub fn children(&self, run_arch: Arch) -> &[String] {
        self.arch_lists
            .get(&run_arch)
            .map(Vec::as_slice)
            .or(self.project_list.as_deref())
            .unwrap_or(&[])
    }

    /// Every child named in any list.
    pub fn all_children(&self) -> impl Iterator<Item = &String> {
        self.project_list
            .iter()
            .flatten()
            .chain(self.arch_lists.values().flatten())
    }

    /// Whether the project packages children on `run_arch`.
    pub fn is_composite(&self, run_arch: Arch) -> bool {
        !self.children(run_arch).is_empty()
    }

    /// Architectures to process: the configured ones or the run architecture.
    pub fn archs(&self, run_arch: Arch) -> Vec<Arch> {
        match &self.arch {
            Some(spec) => {
                let archs = spec.to_vec();
                if archs.is_empty() { vec![run_arch] } else { archs }
            }
            None => vec![run_arch],
        }
    }

    /// Name of the project's drivers in signed driver archives.
    pub fn reference_name<'a>(&'a self, project: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(project)
    }
}
