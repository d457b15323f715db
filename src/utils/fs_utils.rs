// File system utilities

use std::io::Write;
use std::path::Path;

use crate::utils::error::{DiagramError, ErrorKind, Result};

/// Create the directory a file will be written into
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(dir).map_err(|e| {
        DiagramError::new(
            ErrorKind::OutputWrite,
            format!("failed creating output directory {}", dir.display()),
        )
        .with_source(e)
    })
}

/// Write `content` to `stdout` when no path is given, otherwise replace the
/// file at `output_path` atomically through a sibling temp file.
pub fn write_output(content: &str, output_path: Option<&Path>, stdout: &mut dyn Write) -> Result<()> {
    let Some(path) = output_path.filter(|p| !p.as_os_str().is_empty()) else {
        return stdout
            .write_all(content.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| {
                DiagramError::new(ErrorKind::OutputWrite, "failed writing output to stdout").with_source(e)
            });
    };

    ensure_parent_dir(path)?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let write_error = |message: &str, e: std::io::Error| {
        DiagramError::new(ErrorKind::OutputWrite, message).with_source(e)
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".swift-deps-diagram-")
        .tempfile_in(dir)
        .map_err(|e| write_error("failed creating temp output file", e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| write_error("failed writing output file", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| write_error("failed writing output file", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o644))
            .map_err(|e| write_error("failed setting output file permissions", e))?;
    }

    temp.persist(path)
        .map_err(|e| write_error("failed moving output file into place", e.error))?;
    Ok(())
}
