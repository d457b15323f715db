use clap::Args;
use std::path::PathBuf;

use crate::models::options::{DiagramOptions, Mode, OutputFormat};
use crate::services::pipeline::Pipeline;
use crate::utils::config::ConfigParser;
use crate::utils::error::{DiagramError, Result};

/// Flags for generating one dependency diagram
#[derive(Debug, Clone, Args)]
pub struct DiagramCommand {
    /// Project root: a Swift package, Xcode project directory or Bazel workspace
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Explicit .xcodeproj to load
    #[arg(long, value_name = "XCODEPROJ")]
    pub project: Option<PathBuf>,

    /// Explicit .xcworkspace whose project should be loaded
    #[arg(long, value_name = "XCWORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Bazel query scope expression (default //...)
    #[arg(long, value_name = "EXPR")]
    pub bazel_targets: Option<String>,

    /// Input mode: auto|spm|xcode|bazel (default auto)
    #[arg(long)]
    pub mode: Option<String>,

    /// Output format: mermaid|dot|png|terminal (default png)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file path (text formats default to stdout, png to deps.png)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Report where generated files were written
    #[arg(long)]
    pub verbose: bool,

    /// Include test targets in the graph
    #[arg(long)]
    pub include_tests: bool,

    /// Config file (default: .swift-deps-diagram.toml in --path)
    #[arg(long, env = "SWIFT_DEPS_DIAGRAM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl DiagramCommand {
    /// Validate flags and merge them over the config file
    pub fn options(&self) -> Result<DiagramOptions> {
        let format = self.format.as_deref().map(str::parse::<OutputFormat>).transpose()?;
        let mode = self.mode.as_deref().map(str::parse::<Mode>).transpose()?;
        if self.project.is_some() && self.workspace.is_some() {
            return Err(DiagramError::invalid_args(
                "--project and --workspace cannot be used together",
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(DiagramError::invalid_args("--path cannot be empty"));
        }

        let config = ConfigParser::discover(&self.path, self.config.as_deref())?;

        Ok(DiagramOptions {
            path: self.path.clone(),
            project_path: self.project.clone(),
            workspace_path: self.workspace.clone(),
            bazel_targets: self.bazel_targets.clone().or(config.bazel_targets),
            mode: mode.or(config.mode).unwrap_or_default(),
            format: format.or(config.format).unwrap_or_default(),
            output_path: self
                .output
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .or(config.output),
            verbose: self.verbose,
            include_tests: self.include_tests || config.include_tests.unwrap_or(false),
        })
    }

    /// Execute the diagram command
    pub async fn run(&self) -> Result<()> {
        let options = self.options()?;
        if options.mode == Mode::Spm && (options.project_path.is_some() || options.workspace_path.is_some()) {
            tracing::warn!("--project/--workspace are ignored when --mode=spm");
        }

        let mut stdout = std::io::stdout();
        let summary = Pipeline::system().run(&options, &mut stdout).await?;
        tracing::debug!(
            format = %summary.format,
            nodes = summary.node_count,
            edges = summary.edge_count,
            "diagram generated"
        );
        Ok(())
    }
}
