use std::path::Path;
use std::time::Duration;

use crate::services::command_runner::{run_checked, CommandRunner, Invocation};
use crate::utils::error::{DiagramError, ErrorKind, Result};

pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Run `tuist generate --no-open` in a directory containing `Project.swift`
pub async fn generate(runner: &dyn CommandRunner, path: &Path) -> Result<()> {
    if runner.find_program("tuist").is_none() {
        return Err(DiagramError::runtime("tuist not found in PATH"));
    }

    tracing::info!(path = %path.display(), "generating xcode project with tuist");
    let invocation = Invocation::new("tuist", ["generate", "--no-open"], GENERATE_TIMEOUT).in_dir(path);
    run_checked(
        runner,
        &invocation,
        ErrorKind::Runtime,
        &format!("tuist generate in {}", path.display()),
    )
    .await?;
    Ok(())
}
