//! Qt runtime deployment.
//!
//! A table of the libraries, plugins and QML files each supported Qt release
//! ships, filtered by module selection, platform and architecture, and the
//! copy step that puts them next to an application.

mod deploy;
mod release;
mod table;

pub use deploy::{DeployItem, ModulePreset, QtDeployment, deploy_items, select_modules};
pub use release::{DEFAULT_MODULES, MODULES, QtRelease};
pub use table::{DllEntry, FileEntry, QtPlatform, uses_module};
