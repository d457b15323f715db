use std::path::Path;
use std::time::Duration;

use crate::services::command_runner::{run_checked, CommandRunner, Invocation};
use crate::utils::error::{DiagramError, ErrorKind, Result};
use crate::utils::fs_utils::ensure_parent_dir;

pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Render DOT source to a PNG file with `dot -Tpng`
pub async fn write_png(runner: &dyn CommandRunner, dot_source: &str, output_path: &Path) -> Result<()> {
    if output_path.as_os_str().is_empty() {
        return Ok(());
    }
    if runner.find_program("dot").is_none() {
        return Err(DiagramError::new(
            ErrorKind::GraphvizNotFound,
            "graphviz 'dot' binary not found in PATH",
        ));
    }
    ensure_parent_dir(output_path)?;

    let invocation = Invocation::new(
        "dot",
        [
            "-Tpng".to_string(),
            "-o".to_string(),
            output_path.display().to_string(),
        ],
        RENDER_TIMEOUT,
    )
    .with_stdin(dot_source);

    run_checked(runner, &invocation, ErrorKind::GraphvizRender, "graphviz rendering").await?;
    Ok(())
}
