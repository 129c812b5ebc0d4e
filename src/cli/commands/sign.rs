//! `sign`: sign files with the configured signing command.

use super::CommandContext;
use crate::bundler::platform::windows::Signer;
use crate::cli::args::SignArgs;
use crate::error::Result;

pub async fn execute(args: &SignArgs, ctx: &CommandContext) -> Result<i32> {
    let signer = Signer::new(&ctx.tools, args.dry);
    for file in &args.files {
        signer.sign_file(file, args.kind, args.bundle).await?;
        if !args.dry {
            ctx.config.success(&format!("✓ Signed {}", file.display()))?;
        }
    }
    Ok(0)
}
