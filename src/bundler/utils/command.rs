//! External tool invocation.
//!
//! Tools run with inherited stdio so their progress shows up live; only
//! version probes capture output. Every invocation is logged with its full
//! command line.

use crate::bundler::error::{Error, Result};
use std::{
    ffi::{OsStr, OsString},
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
};

/// A fully described tool invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolCommand {
    /// New invocation of `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Working directory of the child.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Extra environment variable for the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Program to run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments as strings, for assertions and plan output.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Working directory, if set.
    pub fn dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    fn build(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Runs the tool and fails on a non-zero exit status.
    pub async fn run(&self) -> Result<()> {
        log::info!("Running: {self}");
        let status = self
            .build()
            .status()
            .await
            .map_err(|error| Error::CommandFailed {
                command: self.program.display().to_string(),
                error,
            })?;

        if !status.success() {
            return Err(Error::ToolFailed {
                command: self.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Runs the tool, or only logs it when `dry_run` is set.
    pub async fn run_or_print(&self, dry_run: bool) -> Result<()> {
        if dry_run {
            println!("{self}");
            return Ok(());
        }
        self.run().await
    }

    /// Runs the tool and returns its standard output.
    pub async fn output(&self) -> Result<String> {
        log::debug!("Probing: {self}");
        let output = self
            .build()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: self.program.display().to_string(),
                error,
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                command: self.to_string(),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_quoted(f, &self.program.to_string_lossy())?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_quoted(f, &arg.to_string_lossy())?;
        }
        if let Some(dir) = &self.current_dir {
            write!(f, "  (in {})", dir.display())?;
        }
        Ok(())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if s.is_empty() || s.contains(char::is_whitespace) {
        write!(f, "\"{s}\"")
    } else {
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let cmd = ToolCommand::new("cmake")
            .args(["-G", "Visual Studio 16 2019"])
            .current_dir("/tmp/build64");
        assert_eq!(
            cmd.to_string(),
            "cmake -G \"Visual Studio 16 2019\"  (in /tmp/build64)"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_tool_failure() {
        let err = ToolCommand::new("false").run().await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { code: Some(1), .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_is_captured() {
        let out = ToolCommand::new("echo").arg("cmake version 3.21.1").output().await.unwrap();
        assert_eq!(out.trim(), "cmake version 3.21.1");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let err = ToolCommand::new("definitely-not-a-real-tool-xyz")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
