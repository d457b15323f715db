use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::graph::Graph;
use crate::models::manifest::Package;
use crate::models::options::{DiagramOptions, Mode, OutputFormat};
use crate::services::command_runner::{CommandRunner, SystemRunner};
use crate::services::input_resolver::{resolve, ResolveRequest, ResolvedInput};
use crate::services::{bazel_query, graph_builder, graphviz, render, swiftpm, tuist, xcode_project};
use crate::utils::error::{DiagramError, ErrorKind, Result};
use crate::utils::fs_utils::write_output;

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub input: ResolvedInput,
    pub format: OutputFormat,
    /// File written, `None` when the diagram went to stdout
    pub output_path: Option<PathBuf>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Message reported in verbose mode after writing a file
    pub notice: Option<String>,
}

/// Resolve, load, build, render and write one diagram
pub struct Pipeline {
    runner: Arc<dyn CommandRunner>,
}

impl Pipeline {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Pipeline running real subprocesses
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    pub async fn run(&self, options: &DiagramOptions, stdout: &mut dyn Write) -> Result<RunSummary> {
        if options.path.as_os_str().is_empty() {
            return Err(DiagramError::invalid_args("--path cannot be empty"));
        }

        let request = ResolveRequest {
            path: options.path.clone(),
            mode: options.mode,
            project_path: options.project_path.clone(),
            workspace_path: options.workspace_path.clone(),
            bazel_targets: options.bazel_targets.clone(),
        };
        let input = resolve(&request)?;
        tracing::debug!(?input, "resolved input");

        let (input, graph) = self.load_graph(input, options.include_tests).await?;
        tracing::debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "built dependency graph");

        let output_path = options
            .output_path
            .clone()
            .filter(|path| !path.as_os_str().is_empty());
        let (output_path, notice) = match options.format {
            OutputFormat::Png => {
                let path = output_path.unwrap_or_else(|| PathBuf::from(OutputFormat::DEFAULT_PNG_PATH));
                let dot = render::render_dot(&graph)?;
                graphviz::write_png(self.runner.as_ref(), &dot, &path).await?;
                let notice = format!("generated png using dot format at {}", path.display());
                (Some(path), Some(notice))
            }
            format => {
                let content = render::render(&graph, format)?;
                write_output(&content, output_path.as_deref(), stdout)?;
                let notice = output_path
                    .as_ref()
                    .map(|path| format!("generated {format} content at {}", path.display()));
                (output_path, notice)
            }
        };

        let notice = notice.filter(|_| options.verbose);
        if let Some(message) = &notice {
            tracing::info!("{message}");
        }

        Ok(RunSummary {
            input,
            format: options.format,
            output_path,
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
            notice,
        })
    }

    /// Load the resolved input and build its graph, generating Tuist projects first.
    ///
    /// Returns the input actually loaded, which differs from `input` after generation.
    pub async fn load_graph(&self, input: ResolvedInput, include_tests: bool) -> Result<(ResolvedInput, Graph)> {
        let runner = self.runner.as_ref();
        let input = match input {
            ResolvedInput::TuistProject { root } => {
                tuist::generate(runner, &root).await?;
                match resolve(&ResolveRequest::new(&root, Mode::Xcode))? {
                    ResolvedInput::TuistProject { root } => {
                        return Err(DiagramError::new(
                            ErrorKind::XcodeProjectNotFound,
                            format!("tuist generate did not produce an .xcodeproj in {}", root.display()),
                        ));
                    }
                    generated => generated,
                }
            }
            other => other,
        };

        let graph = match &input {
            ResolvedInput::Spm { package_path } => {
                let dump = swiftpm::dump_package(runner, package_path).await?;
                let package = Package::from_dump_json(&dump)?;
                for warning in package.consistency_warnings() {
                    tracing::warn!(package = %package.name, "{warning}");
                }
                graph_builder::build_package_graph(&package, include_tests)
            }
            ResolvedInput::Xcode {
                project_path,
                workspace_path,
            } => {
                if let Some(workspace) = workspace_path {
                    tracing::debug!(workspace = %workspace.display(), "using project referenced by workspace");
                }
                let project = xcode_project::load_project(runner, project_path).await?;
                graph_builder::build_xcode_graph(&project, include_tests)
            }
            ResolvedInput::Bazel {
                workspace_path,
                targets,
            } => {
                let workspace = bazel_query::load_workspace(runner, workspace_path, targets).await?;
                graph_builder::build_bazel_graph(&workspace, include_tests)
            }
            ResolvedInput::TuistProject { .. } => {
                return Err(DiagramError::runtime("tuist project was not generated"));
            }
        };

        Ok((input, graph))
    }
}
