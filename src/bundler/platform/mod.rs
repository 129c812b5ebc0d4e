//! Platform specific packaging tools.
//!
//! The packaging flow targets Windows installers; the tools are invoked
//! through their command lines, so the code itself builds on every host
//! and dry runs work anywhere.

pub mod windows;
