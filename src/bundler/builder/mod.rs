//! Run orchestration and the packaging primitives it is built from.
//!
//! - [`orchestrator`] - the [`Bundler`] that plans and executes a run
//! - [`install`] - copy rules for packaging files
//! - [`archive`] - zip archives of install directories
//! - [`naming`] - version headers and installer file names
//! - [`checksum`] - artifact size and SHA-256
//! - [`tool_detection`] - locating Windows build and signing tools

pub mod archive;
pub mod checksum;
pub mod install;
pub mod naming;
pub mod orchestrator;
pub mod tool_detection;

pub use orchestrator::Bundler;
