//! Driver packages: catalogs, attestation cabinets and signed driver
//! extraction.
//!
//! Driver packages keep two sets of catalogs and infs. The plain ones are
//! signed locally for older Windows releases; the `_Win10` copies go into a
//! cabinet that is submitted for attestation signing. Once the signed
//! archive comes back, [`DriverPackager::extract`] swaps the names so the
//! installer ships the attestation signed files.

use super::sign::{SignKind, Signer};
use crate::{
    bail,
    bundler::{
        Result, ToolSettings,
        builder::{
            archive::unzip,
            tool_detection::{find_inf2cat, find_makecab},
        },
        error::ErrorExt,
        utils::{
            ToolCommand,
            fs::{copy_file, copy_tree, glob_in, remove_dir_all, remove_file},
        },
    },
};
use handlebars::Handlebars;
use std::path::{Path, PathBuf};

/// Operating systems the catalog is generated for.
pub const CATALOG_OS_LIST: &str =
    "6_3_X86,7_X86,8_x86,10_X86,6_3_X64,7_X64,8_x64,10_X64,Server6_3_X64,Server8_X64,Server10_X64";

const WIN10: &str = "_Win10";

const DDF_TEMPLATE: &str = r".OPTION EXPLICIT  ; Generate errors
.Set CabinetFileCountThreshold=0
.Set FolderFileCountThreshold=0
.Set FolderSizeThreshold=0
.Set MaxCabinetSize=0
.Set MaxDiskFileCount=0
.Set MaxDiskSize=0
.Set CompressionType=MSZIP
.Set Cabinet=on
.Set Compress=on
.Set UniqueFiles=off
;Specify file name for new cab file
.Set CabinetNameTemplate={{name}}.cab
; Each driver package must be in a separate subfolder.
.Set DestinationDir={{name}}
;Specify files to be included in cab file
{{#each files}}{{this}}
{{/each}}{{#if x86}}.Set DestinationDir={{name}}\x86
{{#each x86}}{{this}}
{{/each}}{{/if}}{{#if x64}}.Set DestinationDir={{name}}\x64
{{#each x64}}{{this}}
{{/each}}{{/if}}";

/// Renders the MakeCab directive file.
///
/// `files` go to the package root, `x86` and `x64` into the matching
/// subfolders.
pub fn ddf_contents(name: &str, files: &[String], x86: &[String], x64: &[String]) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    let data = serde_json::json!({
        "name": name,
        "files": files,
        "x86": x86,
        "x64": x64,
    });
    Ok(handlebars.render_template(DDF_TEMPLATE, &data)?)
}

/// Creates and signs driver catalogs and cabinets.
#[derive(Clone, Debug)]
pub struct DriverPackager {
    inf2cat: Option<PathBuf>,
    makecab: Option<PathBuf>,
    signer: Signer,
    dry_run: bool,
}

impl DriverPackager {
    pub fn new(tools: &ToolSettings, dry_run: bool) -> Self {
        Self {
            inf2cat: tools.inf2cat.clone(),
            makecab: tools.makecab.clone(),
            signer: Signer::new(tools, dry_run),
            dry_run,
        }
    }

    /// Generates `<name>.cat` with Inf2Cat, signs it and makes the `_Win10`
    /// catalog copies.
    pub async fn catalog(&self, name: &str, install_dir: &Path) -> Result<()> {
        self.require_dir(install_dir)?;
        log::info!("Creating driver catalog {name}.cat");

        if !self.dry_run {
            for generated in glob_in(install_dir, &format!("*{WIN10}.*"))? {
                remove_file(&generated).await?;
            }
            remove_file(&install_dir.join("setup.inf")).await?;
            remove_dir_all(&install_dir.join("disk1")).await?;
        }

        let inf2cat = match find_inf2cat(self.inf2cat.as_deref()) {
            Ok(path) => path,
            Err(e) if self.dry_run => {
                log::debug!("{e}");
                PathBuf::from("Inf2Cat.exe")
            }
            Err(e) => return Err(e),
        };
        ToolCommand::new(inf2cat)
            .args(["/verbose", "/driver:."])
            .arg(format!("/os:{CATALOG_OS_LIST}"))
            .current_dir(install_dir)
            .run_or_print(self.dry_run)
            .await?;

        self.signer
            .sign(&install_dir.join(format!("{name}.cat")), SignKind::Driver)
            .await?;

        if !self.dry_run {
            for catalog in glob_in(install_dir, "*.cat")? {
                let Some(stem) = catalog.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                if stem.contains("Win10") {
                    continue;
                }
                copy_file(&catalog, &install_dir.join(format!("{stem}{WIN10}.cat"))).await?;
            }
        }
        Ok(())
    }

    /// Packs the `_Win10` inf and catalogs plus the x86/x64 payloads into
    /// `disk1/<name>.cab` and signs it for attestation submission.
    pub async fn cabinet(&self, name: &str, install_dir: &Path) -> Result<()> {
        self.require_dir(install_dir)?;
        log::info!("Creating driver cabinet {name}.cab");

        let ddf = install_dir.join(format!("{name}.ddf"));
        if !self.dry_run {
            let inf = format!("{name}{WIN10}.inf");
            copy_file(&install_dir.join(format!("{name}.inf")), &install_dir.join(&inf)).await?;

            let mut files = vec![inf];
            files.extend(relative_files(install_dir, "", &format!("*{WIN10}.cat"))?);
            let x86 = relative_files(install_dir, "x86", "*")?;
            let x64 = relative_files(install_dir, "x64", "*")?;

            let contents = ddf_contents(name, &files, &x86, &x64)?;
            tokio::fs::write(&ddf, contents)
                .await
                .fs_context("writing cabinet directives", &ddf)?;
        }

        ToolCommand::new(find_makecab(self.makecab.as_deref()))
            .arg("/f")
            .arg(format!("{name}.ddf"))
            .current_dir(install_dir)
            .run_or_print(self.dry_run)
            .await?;

        self.signer
            .sign(
                &install_dir.join("disk1").join(format!("{name}.cab")),
                SignKind::Driver10,
            )
            .await
    }

    /// Unpacks every `Signed*.zip` in `deployment_dir`, copies
    /// `drivers/<reference>` into `install_dir` and swaps the legacy and
    /// attestation signed inf/catalog names.
    pub async fn extract(&self, reference: &str, install_dir: &Path, deployment_dir: &Path) -> Result<()> {
        if self.dry_run {
            println!(
                "extract {}/Signed*.zip drivers/{reference} => {}",
                deployment_dir.display(),
                install_dir.display()
            );
            return Ok(());
        }
        if !deployment_dir.is_dir() {
            bail!("deployment dir {} does not exist", deployment_dir.display());
        }

        let drivers = deployment_dir.join("drivers");
        remove_dir_all(&drivers).await?;
        for archive in glob_in(deployment_dir, "Signed*.zip")? {
            log::info!("Unpacking {}", archive.display());
            unzip(&archive, deployment_dir).await?;
        }

        let signed = drivers.join(reference);
        if !signed.is_dir() {
            bail!("{} does not exist", signed.display());
        }
        copy_tree(&signed, install_dir, |_| false).await?;

        let file = |name: String| install_dir.join(name);
        rename(file(format!("{reference}{WIN10}.inf")), file(format!("{reference}.inf"))).await?;
        rename(file(format!("{reference}{WIN10}.cat")), file(format!("{reference}_tmp.cat"))).await?;
        rename(file(format!("{reference}.cat")), file(format!("{reference}{WIN10}.cat"))).await?;
        rename(file(format!("{reference}_tmp.cat")), file(format!("{reference}.cat"))).await
    }

    fn require_dir(&self, dir: &Path) -> Result<()> {
        if !self.dry_run && !dir.is_dir() {
            bail!("install dir {} does not exist", dir.display());
        }
        Ok(())
    }
}

async fn rename(from: PathBuf, to: PathBuf) -> Result<()> {
    tokio::fs::rename(&from, &to)
        .await
        .fs_context("renaming", from)
}

/// Files matching `pattern` in `dir/sub`, as `sub\name` relative paths.
fn relative_files(dir: &Path, sub: &str, pattern: &str) -> Result<Vec<String>> {
    let base = if sub.is_empty() { dir.to_path_buf() } else { dir.join(sub) };
    Ok(glob_in(&base, pattern)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .map(|name| if sub.is_empty() { name } else { format!("{sub}\\{name}") })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::builder::archive::zip_dir;

    #[test]
    fn ddf_lists_payload_folders() {
        let ddf = ddf_contents(
            "pxi",
            &["pxi_Win10.inf".into(), "pxi_Win10.cat".into()],
            &[],
            &["x64\\pxi.sys".into()],
        )
        .unwrap();
        assert!(ddf.contains(".Set CabinetNameTemplate=pxi.cab\n"));
        assert!(ddf.ends_with(
            ".Set DestinationDir=pxi\n\
             ;Specify files to be included in cab file\n\
             pxi_Win10.inf\n\
             pxi_Win10.cat\n\
             .Set DestinationDir=pxi\\x64\n\
             x64\\pxi.sys\n"
        ));
        assert!(!ddf.contains("pxi\\x86"));
    }

    #[test]
    fn relative_files_skip_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("x86").join("nested")).unwrap();
        std::fs::write(dir.path().join("x86").join("pxi.sys"), "").unwrap();
        assert_eq!(
            relative_files(dir.path(), "x86", "*").unwrap(),
            ["x86\\pxi.sys"]
        );
        assert!(relative_files(dir.path(), "x64", "*").unwrap().is_empty());
    }

    #[tokio::test]
    async fn extract_swaps_signed_names() {
        let staging = tempfile::tempdir().unwrap();
        let signed = staging.path().join("drivers").join("pxi");
        std::fs::create_dir_all(&signed).unwrap();
        std::fs::write(signed.join("pxi_Win10.inf"), "attested inf").unwrap();
        std::fs::write(signed.join("pxi_Win10.cat"), "attested cat").unwrap();
        std::fs::write(signed.join("pxi.cat"), "legacy cat").unwrap();

        let deploy = tempfile::tempdir().unwrap();
        zip_dir(staging.path(), &deploy.path().join("Signed_1234.zip"))
            .await
            .unwrap();
        std::fs::create_dir_all(deploy.path().join("drivers").join("stale")).unwrap();

        let install = tempfile::tempdir().unwrap();
        DriverPackager::new(&ToolSettings::default(), false)
            .extract("pxi", install.path(), deploy.path())
            .await
            .unwrap();

        let read = |name: &str| std::fs::read_to_string(install.path().join(name)).unwrap();
        assert_eq!(read("pxi.inf"), "attested inf");
        assert_eq!(read("pxi.cat"), "attested cat");
        assert_eq!(read("pxi_Win10.cat"), "legacy cat");
        assert!(!install.path().join("pxi_Win10.inf").exists());
        assert!(!deploy.path().join("drivers").join("stale").exists());
    }

    #[tokio::test]
    async fn extract_requires_reference_dir() {
        let deploy = tempfile::tempdir().unwrap();
        let install = tempfile::tempdir().unwrap();
        let err = DriverPackager::new(&ToolSettings::default(), false)
            .extract("pxi", install.path(), deploy.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn catalog_needs_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = DriverPackager::new(&ToolSettings::default(), false)
            .catalog("pxi", &dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("install dir"));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join(name);
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    fn fake_tools(bin: &Path, log: &Path) -> ToolSettings {
        let log = log.display();
        ToolSettings {
            inf2cat: Some(fake_tool(
                bin,
                "inf2cat.sh",
                &format!("echo \"inf2cat $1 $2\" >> {log}\necho cat > pxi.cat"),
            )),
            makecab: Some(fake_tool(
                bin,
                "makecab.sh",
                &format!("echo \"makecab $1 $2\" >> {log}\nmkdir -p disk1\necho cab > disk1/pxi.cab"),
            )),
            sign_command: Some(fake_tool(bin, "sign.sh", &format!("echo \"$2 $1\" >> {log}"))),
            signtool: Some(bin.join("no-signtool")),
            ..Default::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn catalog_generates_signs_and_copies() {
        let bin = tempfile::tempdir().unwrap();
        let log = bin.path().join("calls.log");
        let install = tempfile::tempdir().unwrap();
        let dir = install.path();
        std::fs::write(dir.join("pxi.inf"), "inf").unwrap();
        std::fs::write(dir.join("pxi_Win10.inf"), "stale").unwrap();
        std::fs::write(dir.join("setup.inf"), "stale").unwrap();
        std::fs::write(dir.join("helperWin10.cat"), "attested").unwrap();
        std::fs::create_dir_all(dir.join("disk1")).unwrap();
        std::fs::write(dir.join("disk1").join("pxi.cab"), "stale").unwrap();

        DriverPackager::new(&fake_tools(bin.path(), &log), false)
            .catalog("pxi", dir)
            .await
            .unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<_> = calls.lines().collect();
        assert_eq!(
            calls,
            [
                "inf2cat /verbose /driver:.".to_string(),
                format!("driver {}", dir.join("pxi.cat").display()),
            ]
        );
        assert!(!dir.join("pxi_Win10.inf").exists());
        assert!(!dir.join("setup.inf").exists());
        assert!(!dir.join("disk1").exists());
        assert_eq!(std::fs::read_to_string(dir.join("pxi_Win10.cat")).unwrap(), "cat\n");
        assert!(dir.join("helperWin10.cat").exists());
        assert!(!dir.join("helperWin10_Win10.cat").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cabinet_packs_win10_files_and_signs_the_cab() {
        let bin = tempfile::tempdir().unwrap();
        let log = bin.path().join("calls.log");
        let install = tempfile::tempdir().unwrap();
        let dir = install.path();
        std::fs::write(dir.join("pxi.inf"), "inf").unwrap();
        std::fs::write(dir.join("pxi_Win10.cat"), "cat").unwrap();
        std::fs::create_dir_all(dir.join("x64")).unwrap();
        std::fs::write(dir.join("x64").join("pxi.sys"), "sys").unwrap();

        DriverPackager::new(&fake_tools(bin.path(), &log), false)
            .cabinet("pxi", dir)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.join("pxi_Win10.inf")).unwrap(), "inf");
        let ddf = std::fs::read_to_string(dir.join("pxi.ddf")).unwrap();
        assert!(ddf.contains("pxi_Win10.inf\npxi_Win10.cat\n"));
        assert!(ddf.contains(".Set DestinationDir=pxi\\x64\nx64\\pxi.sys\n"));

        let calls = std::fs::read_to_string(&log).unwrap();
        let calls: Vec<_> = calls.lines().collect();
        assert_eq!(
            calls,
            [
                "makecab /f pxi.ddf".to_string(),
                format!("driver10 {}", dir.join("disk1").join("pxi.cab").display()),
            ]
        );
    }
}
