//! `msi`: link a WiX installer in a directory of sources.

use super::CommandContext;
use crate::bundler::platform::windows::{WixLinker, WixRequest};
use crate::cli::args::MsiArgs;
use crate::error::Result;

pub async fn execute(args: &MsiArgs, ctx: &CommandContext) -> Result<i32> {
    let working_dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let mut request = WixRequest::new(args.installer_file.clone(), working_dir);
    request.arch = args.arch;
    request.revision = args.rev.clone();
    request.runtime_version = args.runtime_version.clone();
    request.bundle = args.bundle;
    request.clean_only = args.clean;
    request.dry_run = args.dry;

    let linker = WixLinker::new(&ctx.tools, &ctx.workspace)?;
    ctx.config
        .verbose_println(&format!("   WiX binaries: {}", linker.bin_dir().display()))?;

    let installer = linker.link(&request).await?;
    if !args.clean && !args.dry {
        ctx.config
            .success(&format!("✓ Created {}", installer.display()))?;
    }
    Ok(0)
}
