//! Code signing through the site signing command.
//!
//! Signing itself is delegated to an external command invoked as
//! `<command> <file> <kind>`. Signatures are verified with `signtool` when
//! it is installed.

use crate::{
    bail,
    bundler::{
        Error, Result, ToolSettings,
        builder::tool_detection::find_signtool,
        utils::{ToolCommand, fs::remove_file},
    },
};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Signature kind passed to the signing command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignKind {
    /// Chosen from the file extension
    #[default]
    Auto,
    App,
    Driver,
    Driver10,
    Msi,
}

impl SignKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignKind::Auto => "Auto",
            SignKind::App => "app",
            SignKind::Driver => "driver",
            SignKind::Driver10 => "driver10",
            SignKind::Msi => "msi",
        }
    }
}

impl fmt::Display for SignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [
            SignKind::Auto,
            SignKind::App,
            SignKind::Driver,
            SignKind::Driver10,
            SignKind::Msi,
        ]
        .into_iter()
        .find(|k| k.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| {
            Error::GenericError(format!(
                "unknown signature kind `{s}` (expected Auto, app, driver, driver10 or msi)"
            ))
        })
    }
}

/// What signing a file amounts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignAction {
    /// One call of the signing command
    Sign(SignKind),
    /// Engine detach, sign, reattach, sign
    Bundle,
    /// Nothing to sign
    Skip,
}

/// Resolves `kind` for `file`; `Auto` looks at the extension.
pub fn resolve_action(file: &Path, kind: SignKind, bundle: bool) -> SignAction {
    if kind != SignKind::Auto {
        return SignAction::Sign(kind);
    }
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "msi" => SignAction::Sign(SignKind::Msi),
        "exe" if bundle => SignAction::Bundle,
        "exe" => SignAction::Sign(SignKind::App),
        "cab" => SignAction::Sign(SignKind::Driver10),
        _ => SignAction::Skip,
    }
}

/// Signs files with the configured signing command.
#[derive(Clone, Debug)]
pub struct Signer {
    command: PathBuf,
    signtool: Option<PathBuf>,
    wix_bin: Option<PathBuf>,
    dry_run: bool,
}

impl Signer {
    pub fn new(tools: &ToolSettings, dry_run: bool) -> Self {
        Self {
            command: tools.sign_command(),
            signtool: find_signtool(tools.signtool.as_deref()),
            wix_bin: tools.wix_bin_dir(),
            dry_run,
        }
    }

    /// Signs `file`, choosing the flow from `kind` and `bundle`.
    pub async fn sign_file(&self, file: &Path, kind: SignKind, bundle: bool) -> Result<()> {
        match resolve_action(file, kind, bundle) {
            SignAction::Sign(kind) => self.sign(file, kind).await,
            SignAction::Bundle => self.sign_bundle(file).await,
            SignAction::Skip => {
                log::warn!("Don't know how to sign {}, skipped", file.display());
                Ok(())
            }
        }
    }

    /// Runs the signing command once and verifies the result.
    pub async fn sign(&self, file: &Path, kind: SignKind) -> Result<()> {
        if !self.dry_run {
            if !self.command.exists() {
                return Err(Error::ToolNotFound {
                    tool: "signing command",
                    hint: format!(
                        "{} does not exist; set tools.sign_command in packtree.toml",
                        self.command.display()
                    ),
                });
            }
            if !file.exists() {
                bail!("could not find {} to sign", file.display());
            }
        }
        log::info!("Signing {} ({kind})", file.display());
        ToolCommand::new(&self.command)
            .arg(file)
            .arg(kind.as_str())
            .run_or_print(self.dry_run)
            .await?;
        self.verify(file).await
    }

    /// `signtool verify -pa`; skipped when signtool is not installed.
    pub async fn verify(&self, file: &Path) -> Result<()> {
        let Some(signtool) = &self.signtool else {
            log::debug!("signtool not found, skipping verification of {}", file.display());
            return Ok(());
        };
        ToolCommand::new(signtool)
            .args(["verify", "-pa"])
            .arg(file)
            .run_or_print(self.dry_run)
            .await
    }

    /// Signs a WiX bootstrapper: the burn engine is detached and signed
    /// first, then reattached before the bundle itself is signed.
    pub async fn sign_bundle(&self, file: &Path) -> Result<()> {
        let Some(wix_bin) = &self.wix_bin else {
            return Err(Error::ToolNotFound {
                tool: "WiX toolset",
                hint: "set WIX or tools.wix_root in packtree.toml".into(),
            });
        };
        let insignia = wix_bin.join("insignia.exe");
        if !self.dry_run {
            if !insignia.exists() {
                return Err(Error::ToolNotFound {
                    tool: "insignia",
                    hint: format!("{} does not exist", insignia.display()),
                });
            }
            if !file.exists() {
                bail!("could not find {} to sign", file.display());
            }
        }

        let engine = engine_path(file);
        ToolCommand::new(&insignia)
            .arg("-ib")
            .arg(file)
            .arg("-o")
            .arg(&engine)
            .run_or_print(self.dry_run)
            .await?;
        self.sign(&engine, SignKind::App).await?;

        ToolCommand::new(&insignia)
            .arg("-ab")
            .arg(&engine)
            .arg(file)
            .arg("-o")
            .arg(file)
            .run_or_print(self.dry_run)
            .await?;
        if !self.dry_run {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.sign(file, SignKind::App).await?;

        if !self.dry_run {
            remove_file(&engine).await?;
        }
        Ok(())
    }
}

/// `<stem>_engine.exe` next to the bundle.
fn engine_path(bundle: &Path) -> PathBuf {
    let stem = bundle
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    bundle.with_file_name(format!("{stem}_engine.exe"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follows_extension() {
        let auto = |f: &str, bundle| resolve_action(Path::new(f), SignKind::Auto, bundle);
        assert_eq!(auto("Suite.msi", true), SignAction::Sign(SignKind::Msi));
        assert_eq!(auto("Suite.exe", false), SignAction::Sign(SignKind::App));
        assert_eq!(auto("Suite.exe", true), SignAction::Bundle);
        assert_eq!(auto("disk1/pxi.cab", false), SignAction::Sign(SignKind::Driver10));
        assert_eq!(auto("readme.txt", false), SignAction::Skip);
        assert_eq!(
            resolve_action(Path::new("pxi.cat"), SignKind::Driver, false),
            SignAction::Sign(SignKind::Driver)
        );
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("driver10".parse::<SignKind>().unwrap(), SignKind::Driver10);
        assert_eq!("auto".parse::<SignKind>().unwrap(), SignKind::Auto);
        assert!("kernel".parse::<SignKind>().is_err());
    }

    #[test]
    fn engine_sits_next_to_bundle() {
        assert_eq!(
            engine_path(Path::new("out/Suite-x64.exe")),
            PathBuf::from("out/Suite-x64_engine.exe")
        );
    }

    #[tokio::test]
    async fn missing_signing_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Suite.msi");
        std::fs::write(&file, "msi").unwrap();
        let tools = ToolSettings {
            sign_command: Some(dir.path().join("sign.cmd")),
            ..Default::default()
        };
        let err = Signer::new(&tools, false)
            .sign_file(&file, SignKind::Auto, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signing_command_gets_file_and_kind() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let script = dir.path().join("sign.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$2 $1\" >> {}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cab = dir.path().join("pxi.cab");
        std::fs::write(&cab, "cab").unwrap();
        let tools = ToolSettings {
            sign_command: Some(script),
            signtool: Some(dir.path().join("no-signtool")),
            ..Default::default()
        };
        Signer::new(&tools, false)
            .sign_file(&cab, SignKind::Auto, false)
            .await
            .unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.trim(), format!("driver10 {}", cab.display()));
    }
}
