//! `cmake`: configure and build a project in its build directories.

use super::CommandContext;
use crate::bundler::cmake::{CMakeDriver, CMakeRequest, GeneratorFlavor};
use crate::cli::args::CMakeArgs;
use crate::error::Result;

fn flavor(args: &CMakeArgs) -> GeneratorFlavor {
    if args.jom {
        GeneratorFlavor::Jom
    } else if args.ninja {
        GeneratorFlavor::Ninja
    } else if args.xcode {
        GeneratorFlavor::Xcode
    } else {
        GeneratorFlavor::Native
    }
}

pub fn request(args: &CMakeArgs) -> Result<CMakeRequest> {
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    Ok(CMakeRequest {
        project_dir,
        archs: args.archs.clone(),
        build_types: args.build_types.clone(),
        flavor: flavor(args),
        vs_version: args.vs_version.unwrap_or_default(),
        toolset: args.toolset.last().cloned(),
        targets: args.targets.clone(),
        build_dir: args.builddir.clone(),
        clean_cache: !args.no_clean_cache,
        no_regen: args.no_regen,
        graph: args.graph,
        defines: args.defines.clone(),
        extra_args: args.cmake_args.clone(),
        make: args.make,
        make_fast: args.make_fast,
        start_solution: args.start_solution,
        dry_run: args.dryrun,
    })
}

pub async fn execute(args: &CMakeArgs, ctx: &CommandContext) -> Result<i32> {
    let request = request(args)?;
    ctx.config.verbose_println(&format!(
        "   Project {} ({})",
        request.project_dir.display(),
        request
            .unique_archs()
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ))?;

    CMakeDriver::new(ctx.tools.clone(), &ctx.workspace)
        .run(&request)
        .await?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Args, Command};
    use clap::Parser;

    fn cmake_args(argv: &[&str]) -> CMakeArgs {
        let mut full = vec!["packtree", "cmake"];
        full.extend_from_slice(argv);
        match Args::try_parse_from(full).unwrap().command {
            Command::Cmake(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn last_toolset_and_flags_reach_the_request() {
        let args = cmake_args(&[
            "--project-dir", "/src/app", "--toolset", "v140", "--toolset", "v142", "--ninja",
            "--no-clean-cache", "--no-regen", "-m",
        ]);
        let request = request(&args).unwrap();
        assert_eq!(request.toolset.as_deref(), Some("v142"));
        assert_eq!(request.flavor, GeneratorFlavor::Ninja);
        assert!(!request.clean_cache);
        assert!(request.make);
        assert_eq!(request.extra_params()[0], "-DCMAKE_SUPPRESS_REGENERATION:BOOL=1");
    }
}
