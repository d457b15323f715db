// Common error types for swift-deps-diagram

use std::error::Error as StdError;
use std::fmt;

/// Classifies user-facing and runtime failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgs,
    ManifestNotFound,
    InputNotFound,
    AmbiguousInput,
    SwiftNotFound,
    DumpPackage,
    ManifestDecode,
    XcodeProjectNotFound,
    XcodeParse,
    XcodeUnsupportedStructure,
    BazelWorkspaceNotFound,
    BazelBinaryNotFound,
    BazelQueryFailed,
    BazelParseFailed,
    GraphvizNotFound,
    GraphvizRender,
    OutputWrite,
    Runtime,
}

impl ErrorKind {
    /// Stable identifier used in logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgs => "invalid_args",
            Self::ManifestNotFound => "manifest_not_found",
            Self::InputNotFound => "input_not_found",
            Self::AmbiguousInput => "ambiguous_input",
            Self::SwiftNotFound => "swift_not_found",
            Self::DumpPackage => "dump_package_failed",
            Self::ManifestDecode => "manifest_decode_failed",
            Self::XcodeProjectNotFound => "xcode_project_not_found",
            Self::XcodeParse => "xcode_parse_failed",
            Self::XcodeUnsupportedStructure => "xcode_unsupported_structure",
            Self::BazelWorkspaceNotFound => "bazel_workspace_not_found",
            Self::BazelBinaryNotFound => "bazel_binary_not_found",
            Self::BazelQueryFailed => "bazel_query_failed",
            Self::BazelParseFailed => "bazel_parse_failed",
            Self::GraphvizNotFound => "graphviz_not_found",
            Self::GraphvizRender => "graphviz_render_failed",
            Self::OutputWrite => "output_write_failed",
            Self::Runtime => "runtime_failed",
        }
    }

    /// Process exit code for this kind of failure.
    ///
    /// Problems the user can fix by changing the invocation exit with 1,
    /// everything else with 2.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidArgs
            | Self::ManifestNotFound
            | Self::InputNotFound
            | Self::AmbiguousInput
            | Self::XcodeProjectNotFound
            | Self::BazelWorkspaceNotFound => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Typed failure carrying a kind, a message and an optional cause
#[derive(Debug, thiserror::Error)]
#[error("{}", render_message(.message, .source.as_deref()))]
pub struct DiagramError {
    kind: ErrorKind,
    message: String,
    source: Option<BoxedSource>,
}

fn render_message(message: &str, source: Option<&(dyn StdError + Send + Sync + 'static)>) -> String {
    match source {
        Some(source) if message.is_empty() => source.to_string(),
        Some(source) => format!("{message}: {source}"),
        None => message.to_string(),
    }
}

impl DiagramError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxedSource>,
    {
        self.source = Some(source.into());
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub const fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgs, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }
}

pub type Result<T> = std::result::Result<T, DiagramError>;

/// Error formatted for display to the terminal user
#[derive(Debug, Clone)]
pub struct UserError {
    pub message: String,
    pub exit_code: i32,
}

impl UserError {
    pub fn from_diagram_error(err: &DiagramError) -> Self {
        Self {
            message: err.to_string(),
            exit_code: err.exit_code(),
        }
    }

    pub fn print(&self) {
        eprintln!("{}", self.message);
    }
}
