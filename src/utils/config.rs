// Configuration file discovery and TOML parsing

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::options::{Mode, OutputFormat};
use crate::utils::error::{DiagramError, Result};

pub const CONFIG_FILE_NAME: &str = ".swift-deps-diagram.toml";

/// Raw file layout; values are validated after parsing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    diagram: DiagramSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiagramSection {
    mode: Option<String>,
    format: Option<String>,
    output: Option<PathBuf>,
    include_tests: Option<bool>,
    bazel_targets: Option<String>,
}

/// Defaults read from a config file; `None` fields fall back to built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramConfig {
    pub mode: Option<Mode>,
    pub format: Option<OutputFormat>,
    /// Resolved against the directory holding the config file
    pub output: Option<PathBuf>,
    pub include_tests: Option<bool>,
    pub bazel_targets: Option<String>,
    /// File the values came from
    pub source: Option<PathBuf>,
}

/// Configuration parsing and validation utilities
pub struct ConfigParser;

impl ConfigParser {
    /// Load the explicit config file, or `.swift-deps-diagram.toml` next to the input if present
    pub fn discover(input_path: &Path, explicit: Option<&Path>) -> Result<DiagramConfig> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let dir = if input_path.is_file() {
            input_path.parent().unwrap_or(input_path)
        } else {
            input_path
        };
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(DiagramConfig::default())
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<DiagramConfig> {
        if !path.is_file() {
            return Err(DiagramError::invalid_args(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DiagramError::invalid_args(format!("failed to read {}", path.display())).with_source(e)
        })?;

        let mut config = Self::parse(&content).map_err(|e| {
            DiagramError::invalid_args(format!("invalid configuration in {}", path.display())).with_source(e)
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.output = config.output.map(|output| {
            if output.is_absolute() || base.as_os_str().is_empty() {
                output
            } else {
                base.join(output)
            }
        });
        config.source = Some(path.to_path_buf());
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse config TOML; relative output paths are returned unchanged
    pub fn parse(content: &str) -> Result<DiagramConfig> {
        let raw: ConfigToml = toml::from_str(content)
            .map_err(|e| DiagramError::invalid_args("invalid TOML syntax").with_source(e))?;
        let section = raw.diagram;

        let mode = section.mode.as_deref().map(str::parse::<Mode>).transpose()?;
        let format = section
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()?;
        let output = section.output.filter(|p| !p.as_os_str().is_empty());

        Ok(DiagramConfig {
            mode,
            format,
            output,
            include_tests: section.include_tests,
            bazel_targets: section.bazel_targets,
            source: None,
        })
    }
}
