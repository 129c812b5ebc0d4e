//! Configure and build CMake projects.

use super::{BuildDir, CMakeVersion, Generator, GeneratorFlavor, HostPlatform};
use crate::{
    bail,
    bundler::{
        Arch, BuildType, Result, ToolSettings, VsVersion,
        builder::tool_detection::find_msbuild,
        utils::{ToolCommand, fs::glob_in},
    },
};
use std::path::{Path, PathBuf};

/// One configure/build invocation over several architectures.
#[derive(Clone, Debug)]
pub struct CMakeRequest {
    /// Directory holding `CMakeLists.txt`
    pub project_dir: PathBuf,
    /// Architectures, each in its own build directory
    pub archs: Vec<Arch>,
    /// Build types; the first one is used for configuring
    pub build_types: Vec<BuildType>,
    /// Requested generator flavour
    pub flavor: GeneratorFlavor,
    /// Visual Studio version for VS generators
    pub vs_version: VsVersion,
    /// Generator toolset
    pub toolset: Option<String>,
    /// Targets; only the first one is built
    pub targets: Vec<String>,
    /// Build directory override
    pub build_dir: Option<PathBuf>,
    /// Remove `CMakeCache.txt` first
    pub clean_cache: bool,
    /// Add `-DCMAKE_SUPPRESS_REGENERATION:BOOL=1`
    pub no_regen: bool,
    /// Write a dependency graph to `_graph/oxy`
    pub graph: bool,
    /// `-D` definitions without the prefix
    pub defines: Vec<String>,
    /// Arguments appended verbatim
    pub extra_args: Vec<String>,
    /// Build after configuring
    pub make: bool,
    /// Try to build an existing solution before configuring
    pub make_fast: bool,
    /// Open the generated solution or Xcode project
    pub start_solution: bool,
    /// Print commands instead of running them
    pub dry_run: bool,
}

impl Default for CMakeRequest {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            archs: vec![Arch::X64],
            build_types: vec![BuildType::default()],
            flavor: GeneratorFlavor::default(),
            vs_version: VsVersion::default(),
            toolset: None,
            targets: Vec::new(),
            build_dir: None,
            clean_cache: false,
            no_regen: false,
            graph: false,
            defines: Vec::new(),
            extra_args: Vec::new(),
            make: false,
            make_fast: false,
            start_solution: false,
            dry_run: false,
        }
    }
}

impl CMakeRequest {
    /// Parameters appended to every configure call.
    pub fn extra_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        if self.no_regen {
            params.push("-DCMAKE_SUPPRESS_REGENERATION:BOOL=1".to_string());
        }
        params.extend(self.defines.iter().map(|d| format!("-D{d}")));
        if self.graph {
            params.push("--graphviz=_graph/oxy".to_string());
        }
        params.extend(self.extra_args.iter().cloned());
        params
    }

    /// Architectures without duplicates, order kept.
    pub fn unique_archs(&self) -> Vec<Arch> {
        dedup(&self.archs)
    }

    /// Build types without duplicates, order kept.
    pub fn unique_build_types(&self) -> Vec<BuildType> {
        let types = dedup(&self.build_types);
        if types.is_empty() {
            vec![BuildType::default()]
        } else {
            types
        }
    }
}

fn dedup<T: PartialEq + Copy>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(*item);
        }
    }
    out
}

/// Runs CMake and the native build tool.
#[derive(Clone, Debug)]
pub struct CMakeDriver {
    tools: ToolSettings,
    workspace: PathBuf,
    host: HostPlatform,
}

impl CMakeDriver {
    /// Driver for the current host.
    pub fn new(tools: ToolSettings, workspace: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            workspace: workspace.into(),
            host: HostPlatform::current(),
        }
    }

    /// Overrides host detection.
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    /// Generator used for a request on this host.
    pub fn generator(&self, request: &CMakeRequest) -> Generator {
        Generator::select(self.host, request.flavor, request.vs_version)
    }

    /// Configures, and optionally builds, every requested architecture.
    pub async fn run(&self, request: &CMakeRequest) -> Result<()> {
        let generator = self.generator(request);
        let build_types = request.unique_build_types();
        let cmake_version = if generator.uses_msbuild() {
            self.cmake_version(request.dry_run).await?
        } else {
            None
        };

        for arch in request.unique_archs() {
            let dir = BuildDir::resolve(&request.project_dir, arch, request.build_dir.as_deref());
            dir.ensure_valid()?;
            log::info!("CMake {} ({arch}) in {}", generator_label(generator), dir.path().display());
            dir.create(request.dry_run).await?;

            if request.clean_cache {
                if request.dry_run {
                    println!("rm {}", dir.path().join("CMakeCache.txt").display());
                } else {
                    dir.clean_cache().await?;
                }
            }

            if generator.uses_msbuild() && request.make_fast {
                match self.msbuild(&dir, &build_types, &request.targets, request.dry_run).await {
                    Ok(()) => continue,
                    Err(e) => log::warn!("Build without configure failed, configuring: {e}"),
                }
            }

            self.configure(generator, &dir, arch, build_types[0], request, cmake_version)
                .await?;

            if request.start_solution {
                self.start_solution(generator, &dir, request.dry_run).await?;
            }
            if request.make {
                self.build(generator, &dir, &build_types, &request.targets, request.dry_run)
                    .await?;
            }
        }
        Ok(())
    }

    /// Installed CMake version. Probe failures are tolerated in dry runs.
    pub async fn cmake_version(&self, dry_run: bool) -> Result<Option<CMakeVersion>> {
        match CMakeVersion::probe(&self.tools.cmake_program()).await {
            Ok(version) => Ok(version),
            Err(e) if dry_run => {
                log::warn!("Could not determine CMake version: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn configure(
        &self,
        generator: Generator,
        dir: &BuildDir,
        arch: Arch,
        build_type: BuildType,
        request: &CMakeRequest,
        cmake_version: Option<CMakeVersion>,
    ) -> Result<()> {
        if !request.dry_run && !request.project_dir.join("CMakeLists.txt").is_file() {
            bail!("no CMakeLists.txt in {}", request.project_dir.display());
        }

        let toolchain = self.tools.pi_toolchain(&self.workspace);
        let mut args = generator.configure_args(
            arch,
            build_type,
            &request.project_dir,
            request.toolset.as_deref(),
            cmake_version,
            Some(&toolchain),
        );
        args.extend(request.extra_params());

        ToolCommand::new(self.tools.cmake_program())
            .args(args)
            .current_dir(dir.path())
            .run_or_print(request.dry_run)
            .await
    }

    async fn build(
        &self,
        generator: Generator,
        dir: &BuildDir,
        build_types: &[BuildType],
        targets: &[String],
        dry_run: bool,
    ) -> Result<()> {
        match generator {
            Generator::VisualStudio(_) => self.msbuild(dir, build_types, targets, dry_run).await,
            Generator::Xcode => {
                for build_type in build_types {
                    self.cmake_build(dir, targets.first().map(String::as_str), Some(*build_type), dry_run)
                        .await?;
                }
                Ok(())
            }
            _ => {
                self.cmake_build(dir, targets.first().map(String::as_str), None, dry_run)
                    .await
            }
        }
    }

    /// `cmake --build . [--target t] [--config bt] --parallel <cpus>`.
    pub async fn cmake_build(
        &self,
        dir: &BuildDir,
        target: Option<&str>,
        build_type: Option<BuildType>,
        dry_run: bool,
    ) -> Result<()> {
        dir.ensure_valid()?;
        let mut cmd = ToolCommand::new(self.tools.cmake_program()).args(["--build", "."]);
        if let Some(target) = target {
            cmd = cmd.args(["--target", target]);
        }
        if let Some(build_type) = build_type {
            cmd = cmd.arg("--config").arg(build_type.as_str());
        }
        cmd.arg("--parallel")
            .arg(num_cpus::get().to_string())
            .current_dir(dir.path())
            .run_or_print(dry_run)
            .await
    }

    /// Builds the solution, or `<target>.vcxproj`, once per build type.
    pub async fn msbuild(
        &self,
        dir: &BuildDir,
        build_types: &[BuildType],
        targets: &[String],
        dry_run: bool,
    ) -> Result<()> {
        dir.ensure_valid()?;
        let msbuild = match find_msbuild(self.tools.msbuild.as_deref()) {
            Ok(path) => path,
            Err(e) if dry_run => {
                log::debug!("{e}");
                PathBuf::from("MSBuild.exe")
            }
            Err(e) => return Err(e),
        };
        let project = msbuild_project(dir.path(), targets.first().map(String::as_str), dry_run)?;

        for build_type in build_types {
            ToolCommand::new(&msbuild)
                .arg(&project)
                .arg(format!("-p:Configuration={build_type}"))
                .args(["-maxcpucount", "-nologo", "-verbosity:minimal"])
                .current_dir(dir.path())
                .run_or_print(dry_run)
                .await?;
        }
        Ok(())
    }

    /// Runs the generated `install` rule of a configured build directory.
    pub async fn install(
        &self,
        project_dir: &Path,
        arch: Arch,
        build_type: BuildType,
        build_dir: Option<&Path>,
        dry_run: bool,
    ) -> Result<()> {
        let dir = BuildDir::resolve(project_dir, arch, build_dir);
        if self.host == HostPlatform::Windows {
            let target = ["INSTALL".to_string()];
            self.msbuild(&dir, &[build_type], &target, dry_run).await
        } else {
            self.cmake_build(&dir, Some("install"), None, dry_run).await
        }
    }

    async fn start_solution(&self, generator: Generator, dir: &BuildDir, dry_run: bool) -> Result<()> {
        let cmd = match generator {
            Generator::VisualStudio(_) => {
                let solution = single_match(dir.path(), "*.sln", dry_run, "solution")?;
                ToolCommand::new("cmd").args(["/C", "start", ""]).arg(solution)
            }
            Generator::Xcode => {
                let project = single_match(dir.path(), "*.xcodeproj", dry_run, "Xcode project")?;
                ToolCommand::new("open").arg(project)
            }
            _ => {
                log::warn!("Generator {} has no solution to start", generator_label(generator));
                return Ok(());
            }
        };
        cmd.current_dir(dir.path()).run_or_print(dry_run).await
    }
}

fn msbuild_project(dir: &Path, target: Option<&str>, dry_run: bool) -> Result<PathBuf> {
    match target {
        Some(target) => {
            let project = dir.join(format!("{target}.vcxproj"));
            if !dry_run && !project.is_file() {
                bail!("no target {} exists in build dir", project.display());
            }
            Ok(project)
        }
        None => single_match(dir, "*.sln", dry_run, "solution"),
    }
}

fn single_match(dir: &Path, pattern: &str, dry_run: bool, what: &str) -> Result<PathBuf> {
    if dry_run && !dir.is_dir() {
        return Ok(dir.join(pattern));
    }
    match glob_in(dir, pattern)?.into_iter().next() {
        Some(path) => Ok(path),
        None if dry_run => Ok(dir.join(pattern)),
        None => bail!("no {what} found in {}", dir.display()),
    }
}

fn generator_label(generator: Generator) -> String {
    match generator {
        Generator::VisualStudio(vs) => format!("Visual Studio {}", vs.year()),
        Generator::Jom => "JOM".into(),
        Generator::Ninja => "Ninja".into(),
        Generator::Xcode => "Xcode".into(),
        Generator::Makefiles => "Makefiles".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_params_keep_order() {
        let request = CMakeRequest {
            no_regen: true,
            graph: true,
            defines: vec!["WITH_TESTS=ON".into()],
            extra_args: vec!["--trace".into()],
            ..CMakeRequest::default()
        };
        assert_eq!(
            request.extra_params(),
            vec![
                "-DCMAKE_SUPPRESS_REGENERATION:BOOL=1",
                "-DWITH_TESTS=ON",
                "--graphviz=_graph/oxy",
                "--trace"
            ]
        );
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let request = CMakeRequest {
            archs: vec![Arch::X64, Arch::X86, Arch::X64],
            build_types: vec![BuildType::Debug, BuildType::Release, BuildType::Debug],
            ..CMakeRequest::default()
        };
        assert_eq!(request.unique_archs(), vec![Arch::X64, Arch::X86]);
        assert_eq!(
            request.unique_build_types(),
            vec![BuildType::Debug, BuildType::Release]
        );
    }

    #[test]
    fn missing_solution_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(msbuild_project(dir.path(), None, false).is_err());
        std::fs::write(dir.path().join("app.sln"), "").unwrap();
        assert_eq!(
            msbuild_project(dir.path(), None, false).unwrap(),
            dir.path().join("app.sln")
        );
        assert!(msbuild_project(dir.path(), Some("core"), false).is_err());
    }

    #[tokio::test]
    async fn configure_requires_cmakelists() {
        let project = tempfile::tempdir().unwrap();
        let driver = CMakeDriver::new(ToolSettings::default(), project.path())
            .with_host(HostPlatform::Linux);
        let request = CMakeRequest {
            project_dir: project.path().to_path_buf(),
            ..CMakeRequest::default()
        };

        let err = driver.run(&request).await.unwrap_err();
        assert!(err.to_string().contains("CMakeLists.txt"));
        assert!(project.path().join("build64").is_dir());
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let project = tempfile::tempdir().unwrap();
        let driver = CMakeDriver::new(ToolSettings::default(), project.path())
            .with_host(HostPlatform::Windows);
        let request = CMakeRequest {
            project_dir: project.path().to_path_buf(),
            archs: vec![Arch::X86, Arch::X64],
            make: true,
            make_fast: true,
            clean_cache: true,
            dry_run: true,
            ..CMakeRequest::default()
        };

        driver.run(&request).await.unwrap();
        assert!(!project.path().join("build").exists());
        assert!(!project.path().join("build64").exists());
    }
}
