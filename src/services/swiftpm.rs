use std::path::Path;
use std::time::Duration;

use crate::services::command_runner::{run_checked, CommandRunner, Invocation};
use crate::utils::error::{DiagramError, ErrorKind, Result};

pub const DUMP_TIMEOUT: Duration = Duration::from_secs(30);

/// Evaluate `Package.swift` with `swift package dump-package` and return its JSON
pub async fn dump_package(runner: &dyn CommandRunner, package_path: &Path) -> Result<Vec<u8>> {
    if runner.find_program("swift").is_none() {
        return Err(DiagramError::new(
            ErrorKind::SwiftNotFound,
            "swift binary not found in PATH",
        ));
    }

    let invocation = Invocation::new(
        "swift",
        [
            "package".to_string(),
            "dump-package".to_string(),
            "--package-path".to_string(),
            package_path.display().to_string(),
        ],
        DUMP_TIMEOUT,
    )
    .in_dir(package_path);

    let output = run_checked(
        runner,
        &invocation,
        ErrorKind::DumpPackage,
        "swift package dump-package",
    )
    .await?;

    if output.stdout.is_empty() {
        return Err(DiagramError::new(
            ErrorKind::DumpPackage,
            "swift package dump-package produced empty output",
        ));
    }
    Ok(output.stdout)
}
