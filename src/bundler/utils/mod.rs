//! Shared helpers for file operations and tool invocation.

pub mod command;
pub mod fs;

pub use command::ToolCommand;
