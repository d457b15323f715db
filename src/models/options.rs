use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::error::DiagramError;

/// Which kind of project the input is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Detect from the markers present on disk
    #[default]
    Auto,
    /// Swift package (`Package.swift`)
    Spm,
    /// Xcode project or workspace
    Xcode,
    /// Bazel workspace
    Bazel,
}

impl Mode {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Spm, Self::Xcode, Self::Bazel];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Spm => "spm",
            Self::Xcode => "xcode",
            Self::Bazel => "bazel",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DiagramError::invalid_args("--mode must be one of: auto|spm|xcode|bazel"))
    }
}

/// Diagram output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Mermaid flowchart text
    Mermaid,
    /// Graphviz DOT text
    Dot,
    /// PNG image rendered by Graphviz
    #[default]
    Png,
    /// ASCII dependency tree
    Terminal,
}

impl OutputFormat {
    pub const ALL: [Self; 4] = [Self::Mermaid, Self::Dot, Self::Png, Self::Terminal];

    /// Output path used for PNG output when none is given
    pub const DEFAULT_PNG_PATH: &'static str = "deps.png";

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Dot => "dot",
            Self::Png => "png",
            Self::Terminal => "terminal",
        }
    }

    /// Whether this format is written as text rather than an image
    pub const fn is_text(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| {
                DiagramError::invalid_args("--format must be one of: mermaid|dot|png|terminal")
            })
    }
}

/// Fully resolved options for one diagram generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramOptions {
    /// Input path (package root, project, or workspace directory)
    pub path: PathBuf,
    /// Explicit `.xcodeproj`
    pub project_path: Option<PathBuf>,
    /// Explicit `.xcworkspace`
    pub workspace_path: Option<PathBuf>,
    /// Bazel query scope expression
    pub bazel_targets: Option<String>,
    pub mode: Mode,
    pub format: OutputFormat,
    /// Output file; stdout for text formats when absent
    pub output_path: Option<PathBuf>,
    /// Report where generated files were written
    pub verbose: bool,
    /// Keep test targets in the graph
    pub include_tests: bool,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            project_path: None,
            workspace_path: None,
            bazel_targets: None,
            mode: Mode::default(),
            format: OutputFormat::default(),
            output_path: None,
            verbose: false,
            include_tests: false,
        }
    }
}
