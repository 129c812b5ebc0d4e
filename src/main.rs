//! packtree - build, install, package, sign and deploy native projects.
//!
//! Exit code 0 means every requested step succeeded.

use packtree::cli;
use std::process;

#[tokio::main]
async fn main() {
    let args = cli::parse_args();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  → {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
