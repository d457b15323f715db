// CLI module for command-line interface

pub mod diagram;

use clap::Parser;

pub use self::diagram::DiagramCommand;

/// Main CLI structure
#[derive(Debug, Parser)]
#[command(name = "swift-deps-diagram")]
#[command(about = "Generate dependency diagrams for Swift packages, Xcode projects and Bazel workspaces")]
#[command(long_about = r#"Reads a Swift package, an Xcode project or workspace, a Tuist project or a
Bazel workspace and renders its target dependency graph.

Input detection (--mode auto) prefers .xcworkspace/.xcodeproj, then
WORKSPACE/WORKSPACE.bazel/MODULE.bazel, then Package.swift. A directory with
only Project.swift is generated with `tuist generate` first.

Defaults may be set in .swift-deps-diagram.toml under a [diagram] table;
command-line flags take precedence.

Examples:
  swift-deps-diagram --format mermaid              Mermaid flowchart on stdout
  swift-deps-diagram --format terminal             ASCII tree on stdout
  swift-deps-diagram --path App --output app.png   PNG rendered with Graphviz
  swift-deps-diagram --mode bazel --bazel-targets //app/...
  swift-deps-diagram --workspace App.xcworkspace --format dot

Exit codes: 0 success, 1 invalid input or arguments, 2 tool or runtime failure."#)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub diagram: DiagramCommand,
}
