//! Error types for packaging operations.
//!
//! Every fallible operation in [`crate::bundler`] returns [`Result`]. File
//! system failures carry the path and the action that was attempted, tool
//! failures carry the rendered command line.

use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error as DeriveError;

/// Result alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, packaging, signing or deploying.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with a free-form message.
    #[error("{0}")]
    GenericError(String),

    /// Plain I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// I/O error with the attempted action and path.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        error: io::Error,
    },

    /// A tool could not be started.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Program name
        command: String,
        /// Spawn error
        error: io::Error,
    },

    /// A tool ran but returned a non-zero exit status.
    #[error("command `{command}` failed with exit code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "<signal>".into()))]
    ToolFailed {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// A required external tool is not installed.
    #[error("{tool} not found: {hint}")]
    ToolNotFound {
        /// Tool name
        tool: &'static str,
        /// Where it was looked for / how to configure it
        hint: String,
    },

    /// Unsupported or unknown architecture.
    #[error("architecture error: {0}")]
    ArchError(String),

    /// Project referenced in the tree but not configured.
    #[error("project `{0}` is not defined in the project tree")]
    UnknownProject(String),

    /// The project tree references itself.
    #[error("project tree contains a cycle through `{0}`")]
    ProjectCycle(String),

    /// Refused to touch a directory that is not a build directory.
    #[error("not in a build directory: {}", .0.display())]
    NotBuildDir(PathBuf),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid glob pattern.
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// Template render error.
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix error.
    #[error("path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}

/// Attach file system context to I/O results.
pub trait ErrorExt<T> {
    /// Map an I/O error to [`Error::Fs`] with the given action and path.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Attach a message to `Option`s and foreign errors.
pub trait Context<T> {
    /// Convert to [`Result`], prefixing the message.
    fn context<C: Display + Send + Sync + 'static>(self, context: C) -> Result<T>;
    /// Same as [`Context::context`] with a lazily built message.
    fn with_context<C: Display + Send + Sync + 'static, F: FnOnce() -> C>(
        self,
        f: F,
    ) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display + Send + Sync + 'static>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: Display + Send + Sync + 'static, F: FnOnce() -> C>(
        self,
        f: F,
    ) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C: Display + Send + Sync + 'static>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C: Display + Send + Sync + 'static, F: FnOnce() -> C>(
        self,
        f: F,
    ) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
