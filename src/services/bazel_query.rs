use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use crate::models::bazel::{BazelTarget, BazelWorkspace};
use crate::services::command_runner::{run_checked, CommandRunner, Invocation};
use crate::utils::error::{DiagramError, ErrorKind, Result};

pub const QUERY_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_SCOPE: &str = "//...";

/// Blank scopes mean the whole workspace
pub fn normalize_scope(scope: &str) -> String {
    let scope = scope.trim();
    if scope.is_empty() {
        DEFAULT_SCOPE.to_string()
    } else {
        scope.to_string()
    }
}

/// Collect rule targets in `scope` together with their direct rule dependencies
pub async fn load_workspace(
    runner: &dyn CommandRunner,
    workspace_path: &Path,
    scope: &str,
) -> Result<BazelWorkspace> {
    if workspace_path.as_os_str().is_empty() {
        return Err(DiagramError::new(
            ErrorKind::BazelWorkspaceNotFound,
            "bazel workspace path cannot be empty",
        ));
    }
    let scope = normalize_scope(scope);
    let binary = resolve_binary(runner)?;
    let query = Query {
        runner,
        workspace_path,
        binary,
    };

    let rule_expr = format!(r#"kind("rule", {scope})"#);
    let labels = parse_label_lines(&query.run(&rule_expr, "label").await?);
    let kinds = parse_label_kinds(&query.run(&rule_expr, "label_kind").await?)?;

    let mut targets = Vec::with_capacity(labels.len());
    for label in labels {
        let deps_expr = format!(r#"kind("rule", deps({label}, 1))"#);
        let deps = parse_label_lines(&query.run(&deps_expr, "label").await?)
            .into_iter()
            .filter(|dep| dep != &label && (dep.starts_with("//") || dep.starts_with('@')))
            .collect();
        let kind = kinds
            .get(&label)
            .cloned()
            .unwrap_or_else(|| "rule".to_string());
        tracing::debug!(%label, %kind, "loaded bazel target");
        targets.push(BazelTarget { label, kind, deps });
    }

    Ok(BazelWorkspace {
        path: workspace_path.to_path_buf(),
        scope,
        targets,
    })
}

fn resolve_binary(runner: &dyn CommandRunner) -> Result<&'static str> {
    ["bazel", "bazelisk"]
        .into_iter()
        .find(|binary| runner.find_program(binary).is_some())
        .ok_or_else(|| {
            DiagramError::new(
                ErrorKind::BazelBinaryNotFound,
                "neither bazel nor bazelisk was found in PATH",
            )
        })
}

struct Query<'a> {
    runner: &'a dyn CommandRunner,
    workspace_path: &'a Path,
    binary: &'static str,
}

impl Query<'_> {
    async fn run(&self, expr: &str, output: &str) -> Result<String> {
        let args = [
            "query".to_string(),
            expr.to_string(),
            format!("--output={output}"),
            "--noimplicit_deps".to_string(),
            "--notool_deps".to_string(),
        ];
        let invocation = Invocation::new(self.binary, args, QUERY_TIMEOUT).in_dir(self.workspace_path);
        let result = run_checked(self.runner, &invocation, ErrorKind::BazelQueryFailed, "bazel query").await?;
        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }
}

/// Non-empty trimmed lines, unique and sorted
fn parse_label_lines(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `--output=label_kind` lines look like `swift_library rule //app:lib`
fn parse_label_kinds(data: &str) -> Result<HashMap<String, String>> {
    let mut kinds = HashMap::new();
    for line in data.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let parsed = line
            .split_once(" rule ")
            .map(|(kind, label)| (kind.trim(), label.trim()))
            .filter(|(kind, label)| !kind.is_empty() && !label.is_empty());
        let Some((kind, label)) = parsed else {
            return Err(DiagramError::new(
                ErrorKind::BazelParseFailed,
                "failed to parse bazel label_kind output",
            )
            .with_source(format!("invalid label_kind line {line:?}")));
        };
        kinds.insert(label.to_string(), kind.to_string());
    }
    Ok(kinds)
}
