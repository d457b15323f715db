use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for the `swift-deps-diagram` command line

fn diagram_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("swift-deps-diagram").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("SWIFT_DEPS_DIAGRAM_CONFIG");
    cmd
}

/// Command whose PATH holds no external tools
fn isolated_cmd(dir: &TempDir) -> Command {
    let empty_bin = dir.path().join("empty-bin");
    fs::create_dir_all(&empty_bin).unwrap();
    let mut cmd = diagram_cmd(dir);
    cmd.env("PATH", &empty_bin);
    cmd
}

#[test]
fn test_help_lists_flags() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--path"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--bazel-targets"))
        .stdout(predicate::str::contains("--include-tests"));
}

#[test]
fn test_version_flag() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("swift-deps-diagram"));
}

#[test]
fn test_invalid_format_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--format", "svg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--format must be one of: mermaid|dot|png|terminal"));
}

#[test]
fn test_invalid_mode_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--mode", "cocoapods"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--mode must be one of: auto|spm|xcode|bazel"));
}

#[test]
fn test_project_and_workspace_together() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--project", "App.xcodeproj", "--workspace", "App.xcworkspace"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--project and --workspace cannot be used together"));
}

#[test]
fn test_positional_arguments_rejected() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir).arg("Package.swift").assert().code(1);
}

#[test]
fn test_unknown_flag_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir).arg("--colour").assert().code(1);
}

#[test]
fn test_empty_directory_has_no_markers() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--format", "mermaid"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no supported project markers found under"))
        .stderr(predicate::str::contains("WORKSPACE/WORKSPACE.bazel/MODULE.bazel"));
}

#[test]
fn test_spm_mode_without_manifest() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--mode", "spm", "--format", "mermaid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Package.swift not found"));
}

#[test]
fn test_spm_mode_warns_about_xcode_flags() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--mode", "spm", "--project", "App.xcodeproj"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--project/--workspace are ignored when --mode=spm"));
}

#[test]
fn test_missing_input_path() {
    let temp_dir = TempDir::new().unwrap();
    diagram_cmd(&temp_dir)
        .args(["--path", "does-not-exist", "--mode", "bazel"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("input path not found"));
}

#[test]
fn test_missing_swift_binary_exits_two() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Package.swift"), "// swift-tools-version: 5.9\n").unwrap();

    isolated_cmd(&temp_dir)
        .args(["--format", "mermaid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("swift binary not found in PATH"));
}

#[test]
fn test_missing_bazel_binary_exits_two() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("MODULE.bazel"), "").unwrap();

    isolated_cmd(&temp_dir)
        .args(["--format", "terminal"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("neither bazel nor bazelisk was found in PATH"));
}

#[test]
fn test_invalid_config_file_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".swift-deps-diagram.toml"),
        "[diagram]\nformat = \"svg\"\n",
    )
    .unwrap();

    diagram_cmd(&temp_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_config_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("diagram.toml");
    fs::write(&config, "[diagram]\nmode = \"spm\"\n").unwrap();

    diagram_cmd(&temp_dir)
        .env("SWIFT_DEPS_DIAGRAM_CONFIG", &config)
        .args(["--format", "mermaid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Package.swift not found"));
}
