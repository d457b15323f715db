use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use swift_deps_diagram::services::command_runner::{CommandOutput, CommandRunner, Invocation};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn projects_dir() -> PathBuf {
    fixtures_dir().join("projects")
}

pub fn read_dump(name: &str) -> Vec<u8> {
    let path = fixtures_dir().join("dumps").join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

/// Dump fixture standing in for `swift package dump-package` in a project directory
fn dump_for_package(package_dir: &Path) -> Option<&'static str> {
    match package_dir.file_name()?.to_str()? {
        "App" => Some("app.json"),
        "FeatureKit" => Some("feature-kit.json"),
        "CoreKit" => Some("core-kit.json"),
        "hello-spm" => Some("hello-spm.json"),
        _ => None,
    }
}

/// Runner that answers `swift` and `dot` without spawning anything
#[derive(Default)]
pub struct FixtureRunner {
    pub invocations: Mutex<Vec<Invocation>>,
}

impl FixtureRunner {
    pub fn programs(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.program.clone())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FixtureRunner {
    fn find_program(&self, program: &str) -> Option<PathBuf> {
        matches!(program, "swift" | "dot").then(|| PathBuf::from("/opt/fixture/bin").join(program))
    }

    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match invocation.program.as_str() {
            "swift" => {
                let package_dir = invocation.args.last().map(PathBuf::from).unwrap_or_default();
                match dump_for_package(&package_dir) {
                    Some(name) => Ok(CommandOutput::ok(read_dump(name))),
                    None => Ok(CommandOutput::failed(1, "error: Could not find Package.swift")),
                }
            }
            "dot" => {
                let output = invocation
                    .args
                    .iter()
                    .skip_while(|arg| *arg != "-o")
                    .nth(1)
                    .map(PathBuf::from);
                if let Some(path) = output {
                    std::fs::write(path, b"\x89PNG\r\n\x1a\n")?;
                }
                Ok(CommandOutput::ok(""))
            }
            other => Err(io::Error::new(io::ErrorKind::NotFound, format!("{other} not available"))),
        }
    }
}
