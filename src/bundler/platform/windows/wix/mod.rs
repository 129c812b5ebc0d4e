//! Windows Installer creation with the WiX toolset.
//!
//! Installers are linked in the directory holding the project's WiX
//! sources (usually the install dir):
//!
//! 1. copy the C++ runtime merge module as `MergeModule_xANY.msm`
//! 2. copy the shared WiX includes
//! 3. write `ProductVersion.wxi` when `wix_config.json` names a version header
//! 4. harvest the payload with `heat` (not for bootstrapper bundles)
//! 5. compile with `candle`, link with `light`
//! 6. remove intermediates

mod config;
mod extensions;

pub use config::{CONFIG_FILE, VersionConfig, WixConfig};
pub use extensions::{WixTool, extension_args, namespaces};

use crate::{
    bail,
    bundler::{
        Arch, Error, Result, ToolSettings,
        builder::naming::{ProductVersion, product_version_wxi},
        error::ErrorExt,
        utils::{
            ToolCommand,
            fs::{copy_file, copy_tree, glob_in, remove_file},
        },
    },
};
use extensions::HARVEST_OUTPUT;
use std::path::{Path, PathBuf};

/// Name the product sources reference the runtime merge module by.
pub const MERGE_MODULE: &str = "MergeModule_xANY.msm";
pub const VERSION_INCLUDE: &str = "ProductVersion.wxi";
pub const DEFAULT_REVISION: &str = "1234.5";
pub const DEFAULT_RUNTIME: &str = "vs2013";

/// One installer to link.
#[derive(Clone, Debug)]
pub struct WixRequest {
    /// Output file name, relative to `working_dir`
    pub installer_file: String,
    pub arch: Arch,
    pub revision: String,
    /// Runtime merge module set, `vs<year>`
    pub runtime_version: String,
    /// Bootstrapper bundle: nothing to harvest
    pub bundle: bool,
    /// Only remove intermediates
    pub clean_only: bool,
    pub working_dir: PathBuf,
    pub dry_run: bool,
}

impl WixRequest {
    pub fn new(installer_file: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            installer_file: installer_file.into(),
            arch: Arch::X64,
            revision: DEFAULT_REVISION.into(),
            runtime_version: DEFAULT_RUNTIME.into(),
            bundle: false,
            clean_only: false,
            working_dir: working_dir.into(),
            dry_run: false,
        }
    }
}

/// Drives heat, candle and light.
#[derive(Clone, Debug)]
pub struct WixLinker {
    bin_dir: PathBuf,
    workspace: PathBuf,
    msm_dir: PathBuf,
    includes_dir: PathBuf,
}

impl WixLinker {
    /// Fails when no WiX installation is configured.
    pub fn new(tools: &ToolSettings, workspace: &Path) -> Result<Self> {
        let Some(bin_dir) = tools.wix_bin_dir() else {
            return Err(Error::ToolNotFound {
                tool: "WiX toolset",
                hint: "set the WIX environment variable or tools.wix_root in packtree.toml".into(),
            });
        };
        Ok(Self {
            bin_dir,
            workspace: workspace.to_path_buf(),
            msm_dir: tools.runtime_msm_dir(workspace),
            includes_dir: tools.wix_includes_dir(workspace),
        })
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Links the installer and returns its path.
    pub async fn link(&self, request: &WixRequest) -> Result<PathBuf> {
        let dir = &request.working_dir;
        let installer = dir.join(&request.installer_file);
        if request.clean_only {
            clean(dir).await?;
            return Ok(installer);
        }
        log::info!(
            "Linking {} ({}) in {}",
            request.installer_file,
            request.arch,
            dir.display()
        );

        let config = WixConfig::load(dir).await?;
        self.copy_runtime_msm(request).await?;
        self.copy_includes(request).await?;
        self.write_version_include(&config, request).await?;
        if !request.bundle {
            for cmd in self.heat_commands(&config, request.arch) {
                self.tool(cmd, dir).run_or_print(request.dry_run).await?;
            }
        }

        let sources = glob_in(dir, "*.wxs")?;
        let candle_ext = extension_args(&sources, WixTool::Candle, &self.bin_dir, request.arch).await?;
        let candle = self.candle_command(&config, request.arch, &candle_ext, &sources);
        self.tool(candle, dir).run_or_print(request.dry_run).await?;

        let objects = glob_in(dir, "*.wixobj")?;
        let light_ext = extension_args(&sources, WixTool::Light, &self.bin_dir, request.arch).await?;
        let light = self.light_command(&config, &request.installer_file, &light_ext, &objects);
        self.tool(light, dir).run_or_print(request.dry_run).await?;

        if !request.dry_run {
            clean(dir).await?;
        }
        Ok(installer)
    }

    async fn copy_runtime_msm(&self, request: &WixRequest) -> Result<()> {
        let source = self
            .msm_dir
            .join(format!("{}_{}", request.runtime_version, request.arch));
        let dest = request.working_dir.join(MERGE_MODULE);
        if request.dry_run {
            println!("copy {}/* => {}", source.display(), dest.display());
            return Ok(());
        }
        let modules = glob_in(&source, "*")?;
        if modules.is_empty() {
            bail!(
                "Visual Studio runtime merge module not found in {}",
                source.display()
            );
        }
        for module in modules {
            copy_file(&module, &dest).await?;
        }
        Ok(())
    }

    async fn copy_includes(&self, request: &WixRequest) -> Result<()> {
        if request.dry_run {
            println!(
                "copy {} => {}",
                self.includes_dir.display(),
                request.working_dir.display()
            );
            return Ok(());
        }
        copy_tree(&self.includes_dir, &request.working_dir, |_| false).await?;
        Ok(())
    }

    async fn write_version_include(&self, config: &WixConfig, request: &WixRequest) -> Result<()> {
        let Some(header) = config.version_info_file() else {
            return Ok(());
        };
        let header = self.workspace.join(header);
        let dest = request.working_dir.join(VERSION_INCLUDE);
        if request.dry_run {
            println!("version {} => {}", header.display(), dest.display());
            return Ok(());
        }
        let version = ProductVersion::read_header(&header).await?;
        let include = product_version_wxi(&version, &request.revision);
        log::debug!("{include}");
        tokio::fs::write(&dest, include)
            .await
            .fs_context("writing version include", &dest)
    }

    /// One heat call per configured directory, or the default harvest of
    /// the `<arch>` payload directory into `dir.wxs`.
    pub fn heat_commands(&self, config: &WixConfig, arch: Arch) -> Vec<ToolCommand> {
        let heat = self.bin_dir.join("heat.exe");
        match &config.heat {
            Some(entries) => entries
                .iter()
                .map(|(dir, extra)| {
                    ToolCommand::new(&heat)
                        .args(["dir", dir.as_str()])
                        .args(["-gg", "-scom", "-sfrag", "-template", "fragment", "-sreg"])
                        .args(extra)
                })
                .collect(),
            None => vec![
                ToolCommand::new(&heat)
                    .args(["dir", arch.as_str()])
                    .args(["-dir", "APPLICATIONINSTALLDIR"])
                    .args(["-cg", "ExtFiles"])
                    .args(["-dr", "APPLICATIONINSTALLDIR"])
                    .args(["-var", "var.SDir"])
                    .args(["-out", HARVEST_OUTPUT])
                    .args(["-gg", "-scom", "-sfrag", "-srd", "-sreg"]),
            ],
        }
    }

    pub fn candle_command(
        &self,
        config: &WixConfig,
        arch: Arch,
        extensions: &[String],
        sources: &[PathBuf],
    ) -> ToolCommand {
        ToolCommand::new(self.bin_dir.join("candle.exe"))
            .args(["-arch", arch.as_str()])
            .arg(format!("-dSDir={arch}"))
            .args(config.candle.iter().flatten())
            .args(extensions)
            .args(sources.iter().map(|s| file_name(s)))
    }

    pub fn light_command(
        &self,
        config: &WixConfig,
        installer_file: &str,
        extensions: &[String],
        objects: &[PathBuf],
    ) -> ToolCommand {
        ToolCommand::new(self.bin_dir.join("light.exe"))
            .args(extensions)
            .args(["-sice:ICE38", "-sval", "-sw1076", "-out", installer_file])
            .args(config.light.iter().flatten())
            .args(objects.iter().map(|o| file_name(o)))
    }

    /// Runs in `dir`, exporting `WORKSPACE` when the caller has not.
    fn tool(&self, cmd: ToolCommand, dir: &Path) -> ToolCommand {
        let cmd = cmd.current_dir(dir);
        if std::env::var_os("WORKSPACE").is_none() {
            cmd.env("WORKSPACE", &self.workspace)
        } else {
            cmd
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Removes `*.wixobj`, `*.wixpdb` and the harvest output from `dir`.
pub async fn clean(dir: &Path) -> Result<()> {
    log::debug!("Cleaning WiX intermediates in {}", dir.display());
    for pattern in ["*.wixobj", "*.wixpdb"] {
        for file in glob_in(dir, pattern)? {
            remove_file(&file).await?;
        }
    }
    remove_file(&dir.join(HARVEST_OUTPUT)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linker(ws: &Path) -> WixLinker {
        let tools = ToolSettings {
            wix_root: Some(PathBuf::from("/wix")),
            ..Default::default()
        };
        WixLinker::new(&tools, ws).unwrap()
    }

    #[test]
    fn default_harvest_reads_arch_dir() {
        let cmds = linker(Path::new("/ws")).heat_commands(&WixConfig::default(), Arch::X86);
        assert_eq!(cmds.len(), 1);
        assert_eq!(
            cmds[0].arg_strings().join(" "),
            "dir x86 -dir APPLICATIONINSTALLDIR -cg ExtFiles -dr APPLICATIONINSTALLDIR \
             -var var.SDir -out dir.wxs -gg -scom -sfrag -srd -sreg"
        );
    }

    #[test]
    fn configured_harvest_appends_extra_args() {
        let config: WixConfig =
            serde_json::from_str(r#"{"heat": {"bin": ["-cg", "Bin", "-out", "bin.wxs"]}}"#).unwrap();
        let cmds = linker(Path::new("/ws")).heat_commands(&config, Arch::X64);
        assert_eq!(
            cmds[0].arg_strings().join(" "),
            "dir bin -gg -scom -sfrag -template fragment -sreg -cg Bin -out bin.wxs"
        );
    }

    #[test]
    fn candle_and_light_layout() {
        let config: WixConfig =
            serde_json::from_str(r#"{"candle": ["-dX=1"], "light": ["-cultures:en-us"]}"#).unwrap();
        let linker = linker(Path::new("/ws"));
        let ext = vec!["-ext".to_string(), "UI.dll".to_string()];

        let candle = linker.candle_command(
            &config,
            Arch::X64,
            &ext,
            &[PathBuf::from("/in/product.wxs"), PathBuf::from("/in/dir.wxs")],
        );
        assert_eq!(
            candle.arg_strings().join(" "),
            "-arch x64 -dSDir=x64 -dX=1 -ext UI.dll product.wxs dir.wxs"
        );
        assert!(candle.program().ends_with("candle.exe"));

        let light = linker.light_command(&config, "Suite.msi", &ext, &[PathBuf::from("/in/product.wixobj")]);
        assert_eq!(
            light.arg_strings().join(" "),
            "-ext UI.dll -sice:ICE38 -sval -sw1076 -out Suite.msi -cultures:en-us product.wixobj"
        );
    }

    #[test]
    fn missing_wix_is_reported() {
        let tools = ToolSettings::default();
        if std::env::var_os("WIX").is_none() {
            assert!(matches!(
                WixLinker::new(&tools, Path::new("/ws")),
                Err(Error::ToolNotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn runtime_merge_module_is_required() {
        let ws = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let request = WixRequest::new("Suite.msi", work.path());
        let err = linker(ws.path()).link(&request).await.unwrap_err();
        assert!(err.to_string().contains("merge module"));
    }

    #[tokio::test]
    async fn clean_removes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["product.wixobj", "Suite.wixpdb", "dir.wxs", "product.wxs"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        clean(dir.path()).await.unwrap();
        assert!(dir.path().join("product.wxs").exists());
        assert!(!dir.path().join("dir.wxs").exists());
        assert!(!dir.path().join("product.wixobj").exists());
        assert!(!dir.path().join("Suite.wixpdb").exists());
    }
}
