use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use swift_deps_diagram::models::options::{DiagramOptions, Mode, OutputFormat};
use swift_deps_diagram::services::input_resolver::ResolvedInput;
use swift_deps_diagram::services::pipeline::Pipeline;
use swift_deps_diagram::ErrorKind;

use super::support::{projects_dir, FixtureRunner};

fn options_for(project: &str, format: OutputFormat) -> DiagramOptions {
    DiagramOptions {
        path: projects_dir().join(project),
        format,
        ..DiagramOptions::default()
    }
}

async fn render_to_string(options: &DiagramOptions) -> String {
    let pipeline = Pipeline::new(Arc::new(FixtureRunner::default()));
    let mut stdout = Vec::new();
    pipeline.run(options, &mut stdout).await.unwrap();
    String::from_utf8(stdout).unwrap()
}

#[tokio::test]
async fn test_local_path_app_as_mermaid() {
    let out = render_to_string(&options_for("local-path-deps/App", OutputFormat::Mermaid)).await;
    let expected = "flowchart TD\n    \
        n1[\"FeatureKit\"]\n    \
        n2[\"Alamofire\"]\n    \
        n3[\"ExampleApp\"]\n    \
        n3 --> n1\n    \
        n3 --> n2";
    assert_eq!(out, expected);
}

#[tokio::test]
async fn test_local_path_app_as_terminal_tree() {
    let out = render_to_string(&options_for("local-path-deps/App", OutputFormat::Terminal)).await;
    assert_eq!(out, "ExampleApp\n|-- Alamofire\n\\-- FeatureKit");
}

#[tokio::test]
async fn test_feature_kit_as_dot() {
    let out = render_to_string(&options_for("local-path-deps/FeatureKit", OutputFormat::Dot)).await;
    assert!(out.starts_with("digraph dependencies {"));
    assert!(out.contains("\"name::CoreKit\" [label=\"CoreKit\",shape=ellipse,style=dashed];"));
    assert!(out.contains("\"target::FeatureKit\" -> \"name::CoreKit\";"));
}

#[tokio::test]
async fn test_include_tests_for_core_kit() {
    let mut options = options_for("local-path-deps/CoreKit", OutputFormat::Terminal);
    assert_eq!(render_to_string(&options).await, "CoreKit");

    options.include_tests = true;
    assert_eq!(render_to_string(&options).await, "CoreKitTests\n\\-- CoreKit");
}

#[tokio::test]
async fn test_output_is_stable_across_runs() {
    let options = options_for("hello-spm", OutputFormat::Mermaid);
    let first = render_to_string(&options).await;
    let second = render_to_string(&options).await;
    assert_eq!(first, second);
    assert!(first.contains("[\"Alamofire\"]"));
}

#[tokio::test]
async fn test_text_output_written_to_file_with_verbose_notice() {
    let temp = TempDir::new().unwrap();
    let out_path = temp.path().join("diagrams/hello.mmd");
    let mut options = options_for("hello-spm", OutputFormat::Mermaid);
    options.output_path = Some(out_path.clone());
    options.verbose = true;

    let pipeline = Pipeline::new(Arc::new(FixtureRunner::default()));
    let mut stdout = Vec::new();
    let summary = pipeline.run(&options, &mut stdout).await.unwrap();

    assert!(stdout.is_empty());
    assert!(fs::read_to_string(&out_path).unwrap().starts_with("flowchart TD"));
    assert_eq!(
        summary.notice,
        Some(format!("generated mermaid content at {}", out_path.display()))
    );
    assert!(matches!(summary.input, ResolvedInput::Spm { .. }));
}

#[tokio::test]
async fn test_png_written_through_dot() {
    let temp = TempDir::new().unwrap();
    let png = temp.path().join("hello.png");
    let mut options = options_for("hello-spm", OutputFormat::Png);
    options.output_path = Some(png.clone());

    let runner = Arc::new(FixtureRunner::default());
    let pipeline = Pipeline::new(runner.clone());
    let summary = pipeline.run(&options, &mut Vec::new()).await.unwrap();

    assert_eq!(runner.programs(), vec!["swift", "dot"]);
    assert!(fs::read(&png).unwrap().starts_with(b"\x89PNG"));
    assert_eq!(summary.output_path, Some(png));
    assert!(summary.notice.is_none());
}

#[tokio::test]
async fn test_spm_mode_requires_manifest() {
    let temp = TempDir::new().unwrap();
    let options = DiagramOptions {
        path: temp.path().to_path_buf(),
        mode: Mode::Spm,
        format: OutputFormat::Mermaid,
        ..DiagramOptions::default()
    };
    let pipeline = Pipeline::new(Arc::new(FixtureRunner::default()));
    let err = pipeline.run(&options, &mut Vec::new()).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::ManifestNotFound));
    assert_eq!(err.exit_code(), 1);
}
