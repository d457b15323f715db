use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::options::Mode;
use crate::services::bazel_query::normalize_scope;
use crate::utils::error::{DiagramError, ErrorKind, Result};

pub const PACKAGE_MANIFEST: &str = "Package.swift";
pub const TUIST_MANIFEST: &str = "Project.swift";
pub const BAZEL_MARKERS: [&str; 3] = ["WORKSPACE", "WORKSPACE.bazel", "MODULE.bazel"];

/// What the user pointed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub path: PathBuf,
    pub mode: Mode,
    pub project_path: Option<PathBuf>,
    pub workspace_path: Option<PathBuf>,
    pub bazel_targets: Option<String>,
}

impl ResolveRequest {
    pub fn new(path: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            path: path.into(),
            mode,
            project_path: None,
            workspace_path: None,
            bazel_targets: None,
        }
    }
}

/// A concrete input the pipeline knows how to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    Spm {
        package_path: PathBuf,
    },
    Xcode {
        project_path: PathBuf,
        workspace_path: Option<PathBuf>,
    },
    /// A directory with `Project.swift` but no generated `.xcodeproj` yet
    TuistProject {
        root: PathBuf,
    },
    Bazel {
        workspace_path: PathBuf,
        targets: String,
    },
}

impl ResolvedInput {
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Spm { .. } => Mode::Spm,
            Self::Xcode { .. } | Self::TuistProject { .. } => Mode::Xcode,
            Self::Bazel { .. } => Mode::Bazel,
        }
    }
}

/// Decide which project kind to load for a request
pub fn resolve(request: &ResolveRequest) -> Result<ResolvedInput> {
    if request.project_path.is_some() && request.workspace_path.is_some() {
        return Err(DiagramError::invalid_args(
            "--project and --workspace cannot be used together",
        ));
    }

    let base = absolutize(&request.path).map_err(|e| {
        DiagramError::new(ErrorKind::InputNotFound, "failed to resolve input path").with_source(e)
    })?;
    let targets = || normalize_scope(request.bazel_targets.as_deref().unwrap_or_default());
    let xcode_flags_given = request.project_path.is_some() || request.workspace_path.is_some();

    match request.mode {
        Mode::Spm => Ok(ResolvedInput::Spm {
            package_path: resolve_package_path(&base)?,
        }),
        Mode::Bazel => Ok(ResolvedInput::Bazel {
            workspace_path: resolve_bazel_workspace(&base)?,
            targets: targets(),
        }),
        Mode::Xcode => match resolve_xcode(&base, request) {
            Err(err) if !xcode_flags_given && is_tuist_candidate(&base, &err) => {
                Ok(ResolvedInput::TuistProject { root: base })
            }
            other => other,
        },
        Mode::Auto if xcode_flags_given => resolve_xcode(&base, request),
        Mode::Auto => {
            if let Ok(resolved) = resolve_xcode(&base, request) {
                return Ok(resolved);
            }

            match resolve_bazel_workspace(&base) {
                Ok(workspace_path) => {
                    return Ok(ResolvedInput::Bazel {
                        workspace_path,
                        targets: targets(),
                    })
                }
                Err(err) if !err.is_kind(ErrorKind::BazelWorkspaceNotFound) => return Err(err),
                Err(_) => {}
            }

            match resolve_package_path(&base) {
                Ok(package_path) => return Ok(ResolvedInput::Spm { package_path }),
                Err(err) if !err.is_kind(ErrorKind::ManifestNotFound) => return Err(err),
                Err(_) => {}
            }

            if base.join(TUIST_MANIFEST).is_file() {
                return Ok(ResolvedInput::TuistProject { root: base });
            }

            Err(DiagramError::new(
                ErrorKind::InputNotFound,
                format!(
                    "no supported project markers found under {} (checked .xcworkspace/.xcodeproj, WORKSPACE/WORKSPACE.bazel/MODULE.bazel, and Package.swift)",
                    base.display()
                ),
            ))
        }
    }
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    std::path::absolute(path)
}

fn is_tuist_candidate(base: &Path, err: &DiagramError) -> bool {
    err.is_kind(ErrorKind::XcodeProjectNotFound) && base.is_dir() && base.join(TUIST_MANIFEST).is_file()
}

fn input_not_found(err: std::io::Error) -> DiagramError {
    DiagramError::new(ErrorKind::InputNotFound, "input path not found").with_source(err)
}

fn resolve_package_path(path: &Path) -> Result<PathBuf> {
    let metadata = fs::metadata(path).map_err(input_not_found)?;
    if !metadata.is_dir() {
        if path.file_name().is_some_and(|name| name == PACKAGE_MANIFEST) {
            return Ok(parent_of(path));
        }
        return Err(DiagramError::new(
            ErrorKind::ManifestNotFound,
            "Package.swift not found",
        ));
    }

    let manifest = path.join(PACKAGE_MANIFEST);
    if !manifest.exists() {
        return Err(DiagramError::new(
            ErrorKind::ManifestNotFound,
            format!("Package.swift not found at {}", manifest.display()),
        ));
    }
    Ok(path.to_path_buf())
}

fn resolve_bazel_workspace(path: &Path) -> Result<PathBuf> {
    let metadata = fs::metadata(path).map_err(input_not_found)?;
    if !metadata.is_dir() {
        let is_marker = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| BAZEL_MARKERS.contains(&name));
        if is_marker {
            return Ok(parent_of(path));
        }
        return Err(DiagramError::new(
            ErrorKind::BazelWorkspaceNotFound,
            "bazel workspace markers not found",
        ));
    }

    if BAZEL_MARKERS.iter().any(|marker| path.join(marker).exists()) {
        return Ok(path.to_path_buf());
    }
    Err(DiagramError::new(
        ErrorKind::BazelWorkspaceNotFound,
        format!(
            "no WORKSPACE/WORKSPACE.bazel/MODULE.bazel found in {}",
            path.display()
        ),
    ))
}

fn resolve_xcode(base: &Path, request: &ResolveRequest) -> Result<ResolvedInput> {
    if let Some(project) = &request.project_path {
        let project_path = absolutize(project).map_err(|e| {
            DiagramError::new(ErrorKind::XcodeProjectNotFound, "failed to resolve --project path").with_source(e)
        })?;
        if !project_path.exists() {
            return Err(DiagramError::new(
                ErrorKind::XcodeProjectNotFound,
                format!("xcode project not found at {}", project_path.display()),
            ));
        }
        return Ok(ResolvedInput::Xcode {
            project_path,
            workspace_path: None,
        });
    }

    if let Some(workspace) = &request.workspace_path {
        let workspace_path = absolutize(workspace).map_err(|e| {
            DiagramError::new(ErrorKind::XcodeProjectNotFound, "failed to resolve --workspace path").with_source(e)
        })?;
        return xcode_from_workspace(workspace_path);
    }

    if !base.exists() {
        return Err(input_not_found(std::io::Error::from(std::io::ErrorKind::NotFound)));
    }

    // Bundles are directories, so check the extension before listing children
    match base.extension().and_then(|ext| ext.to_str()) {
        Some("xcodeproj") => {
            return Ok(ResolvedInput::Xcode {
                project_path: base.to_path_buf(),
                workspace_path: None,
            })
        }
        Some("xcworkspace") => return xcode_from_workspace(base.to_path_buf()),
        _ => {}
    }
    if !base.is_dir() {
        return Err(DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            "xcode project or workspace not found",
        ));
    }

    if let Some(workspace_path) = first_with_extension(base, "xcworkspace") {
        return xcode_from_workspace(workspace_path);
    }
    if let Some(project_path) = first_with_extension(base, "xcodeproj") {
        return Ok(ResolvedInput::Xcode {
            project_path,
            workspace_path: None,
        });
    }

    Err(DiagramError::new(
        ErrorKind::XcodeProjectNotFound,
        format!("no .xcworkspace/.xcodeproj found in {}", base.display()),
    ))
}

fn xcode_from_workspace(workspace_path: PathBuf) -> Result<ResolvedInput> {
    let project_path = find_project_for_workspace(&workspace_path)?;
    Ok(ResolvedInput::Xcode {
        project_path,
        workspace_path: Some(workspace_path),
    })
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Lexically first entry of `dir` named `*.<extension>`
fn first_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Project referenced by `contents.xcworkspacedata`, else the first `.xcodeproj`
/// next to the workspace
fn find_project_for_workspace(workspace_path: &Path) -> Result<PathBuf> {
    if !workspace_path.exists() {
        return Err(DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            format!("workspace not found at {}", workspace_path.display()),
        ));
    }
    let parent = parent_of(workspace_path);

    if let Ok(contents) = fs::read_to_string(workspace_path.join("contents.xcworkspacedata")) {
        for location in workspace_project_locations(&contents)? {
            let candidate = match location.strip_prefix("absolute:") {
                Some(absolute) => PathBuf::from(absolute),
                None => parent.join(location),
            };
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    first_with_extension(&parent, "xcodeproj").ok_or_else(|| {
        DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            format!("no .xcodeproj found for workspace {}", workspace_path.display()),
        )
    })
}

/// `.xcodeproj` locations in document order with `group:`, `container:` and
/// `self:` prefixes removed
fn workspace_project_locations(contents: &str) -> Result<Vec<String>> {
    let re = Regex::new(r#"location\s*=\s*"([^"]+\.xcodeproj)""#)
        .map_err(|e| DiagramError::runtime("invalid workspace location pattern").with_source(e))?;

    Ok(re
        .captures_iter(contents)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let mut location = m.as_str().trim();
            for prefix in ["group:", "container:", "self:"] {
                location = location.strip_prefix(prefix).unwrap_or(location);
            }
            location.to_string()
        })
        .collect())
}
