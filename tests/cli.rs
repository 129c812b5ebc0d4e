use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const TREE: &str = r#"{
    "suite": {
        "project_list": ["viewer", "tools"],
        "msi": true,
        "setup_name": "suite_%ARCH%.msi"
    },
    "viewer": {"project_dir": "apps/viewer", "arch": ["x86", "x64"], "install": true},
    "tools": {"project_list": ["cli"], "project_list_x86": []},
    "cli": {"project_dir": "apps/cli"}
}"#;

fn workspace(tree: &str) -> TempDir {
    let ws = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(ws.path().join("packaging").join("Win")).unwrap();
    std::fs::write(ws.path().join("packaging").join("project_tree.json"), tree).unwrap();
    std::fs::write(ws.path().join("packtree.toml"), "").unwrap();
    ws
}

fn packtree(ws: &Path) -> Command {
    let mut cmd = Command::cargo_bin("packtree").unwrap();
    cmd.current_dir(ws).arg("--workspace").arg(ws);
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("packtree")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("version-wxi"));
}

#[test]
fn tree_prints_nested_projects() {
    let ws = workspace(TREE);
    packtree(ws.path())
        .args(["tree", "-p", "suite"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "Project Tree:\n\
             -- suite (x64)\n\
             ---- viewer (x86, x64)\n\
             ---- tools (x64)\n\
             ------ cli (x64)\n",
        ));
}

#[test]
fn tree_uses_arch_specific_lists() {
    let ws = workspace(TREE);
    packtree(ws.path())
        .args(["tree", "-p", "suite", "-a", "x86"])
        .assert()
        .success()
        .stdout(predicate::str::contains("---- tools (x86)\n"))
        .stdout(predicate::str::contains("cli").not());
}

#[cfg(unix)]
#[test]
fn dry_build_with_sign_still_signs_the_installer() {
    use std::os::unix::fs::PermissionsExt;

    let ws = workspace(TREE);
    let log = ws.path().join("calls.log");
    let script = ws.path().join("sign.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$2 $1\" >> {}\n", log.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(
        ws.path().join("packtree.toml"),
        format!(
            "[tools]\nsign_command = '{}'\nsigntool = '{}'\n",
            script.display(),
            ws.path().join("no-signtool").display()
        ),
    )
    .unwrap();

    let install = ws.path().join("tmp").join("build_dir").join("suite");
    std::fs::create_dir_all(&install).unwrap();
    let setup = install.join("suite_x64.msi");
    std::fs::write(&setup, "msi").unwrap();

    packtree(ws.path())
        .args(["build", "-p", "packaging/Win/suite", "--dry", "--sign"])
        .assert()
        .success();

    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(calls.trim(), format!("msi {}", setup.display()));
}

#[test]
fn dry_build_with_sign_needs_the_signing_command() {
    let ws = workspace(TREE);
    packtree(ws.path())
        .args(["build", "-p", "suite", "--dry", "--sign"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signing command"));
}

#[test]
fn dry_build_without_sign_only_merges() {
    let ws = workspace(TREE);
    packtree(ws.path())
        .args(["build", "-p", "suite", "--dry"])
        .assert()
        .success()
        .stderr(predicate::str::contains("sign ").not());
    assert!(ws.path().join("tmp").join("build_dir").join("suite").is_dir());
    assert!(!ws.path().join("PKGS").exists());
}

#[test]
fn show_tree_precedes_the_run() {
    let ws = workspace(TREE);
    packtree(ws.path())
        .args(["build", "-p", "suite", "--dry", "--show-tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project Tree:\n-- suite (x64)\n"));
}

#[test]
fn ignore_marker_ends_the_run_successfully() {
    let ws = workspace(TREE);
    let package = ws.path().join("packaging").join("Win").join("suite");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("dwignore"), "").unwrap();

    packtree(ws.path())
        .args(["build", "-p", "suite", "--sign", "--dry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ignored"))
        .stdout(predicate::str::contains("suite_x64.msi").not());
}

#[test]
fn undefined_child_fails() {
    let ws = workspace(r#"{"suite": {"project_list": ["ghost"], "msi": true}}"#);
    packtree(ws.path())
        .args(["build", "-p", "suite", "--dry"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("`ghost` is not defined"));
}

#[test]
fn cyclic_tree_fails() {
    let ws = workspace(r#"{"a": {"project_list": ["b"]}, "b": {"project_list": ["a"]}}"#);
    packtree(ws.path())
        .args(["tree", "-p", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn version_wxi_prints_include() {
    let dir = tempfile::tempdir().unwrap();
    let header = dir.path().join("version.h");
    std::fs::write(
        &header,
        "#define VERSION_MAJOR 7\n#define VERSION_MINOR 3\n#define VERSION_MICRO 1\n",
    )
    .unwrap();

    packtree(dir.path())
        .arg("version-wxi")
        .arg(&header)
        .arg("42")
        .assert()
        .success()
        .stdout("<Include><?define PRODUCT_VERSION=\"7.3.1.42\"?></Include>\n");
}

#[test]
fn versionize_renames_file() {
    let dir = tempfile::tempdir().unwrap();
    let header = dir.path().join("version.h");
    std::fs::write(&header, "#define VERSION_MAJOR 2\n#define VERSION_MINOR 5\n").unwrap();
    let file = dir.path().join("setup.exe");
    std::fs::write(&file, "payload").unwrap();

    packtree(dir.path())
        .arg("versionize")
        .arg("-f")
        .arg(&file)
        .arg("--version-header")
        .arg(&header)
        .args(["-r", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("setup-2-5-0-99.exe"));

    assert!(!file.exists());
    assert!(dir.path().join("setup-2-5-0-99.exe").is_file());
}

#[test]
fn invalid_tool_config_is_reported() {
    let ws = workspace(TREE);
    std::fs::write(ws.path().join("packtree.toml"), "[tools]\ncmkae = \"cmake\"\n").unwrap();
    packtree(ws.path())
        .args(["tree", "-p", "suite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tool configuration"));
}
