//! `versionize` and `version-wxi`: product version helpers.

use super::CommandContext;
use crate::bundler::builder::naming::{ProductVersion, product_version_wxi, versionize};
use crate::cli::args::{VersionWxiArgs, VersionizeArgs};
use crate::error::Result;

/// Renames the file and prints its new name.
pub async fn versionize_file(args: &VersionizeArgs, ctx: &CommandContext) -> Result<i32> {
    let renamed = versionize(&args.file, &args.version_header, &args.revision).await?;
    ctx.config
        .output()
        .plain(&format!("{}\n", renamed.display()))?;
    Ok(0)
}

/// Prints the `ProductVersion.wxi` include.
pub async fn version_wxi(args: &VersionWxiArgs, ctx: &CommandContext) -> Result<i32> {
    let version = ProductVersion::read_header(&args.header).await?;
    ctx.config
        .output()
        .plain(&format!("{}\n", product_version_wxi(&version, &args.revision)))?;
    Ok(0)
}
