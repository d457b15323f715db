use std::fs;

use swift_deps_diagram::models::manifest::{Package, PackageDependency};

use super::support::{projects_dir, read_dump};

// The local-path project chains ExampleApp -> FeatureKit -> CoreKit on disk

fn manifest_declares_product(package_dir: &std::path::Path, product: &str) -> bool {
    let manifest = fs::read_to_string(package_dir.join("Package.swift")).unwrap();
    manifest.contains(&format!(".library(name: \"{product}\""))
}

#[test]
fn test_app_depends_on_feature_kit_by_path() {
    let app_dir = projects_dir().join("local-path-deps/App");
    let app = Package::from_dump_json(&read_dump("app.json")).unwrap();

    let local = app.local_dependencies(&app_dir);
    assert_eq!(local.len(), 1);
    let (dependency, path) = &local[0];
    assert!(dependency.matches("FeatureKit"));
    assert!(path.join("Package.swift").is_file(), "{} has no manifest", path.display());
    assert!(manifest_declares_product(path, "FeatureKit"));

    let target = app.target("ExampleApp").unwrap();
    assert!(target.dependencies.iter().any(|d| d.name() == Some("FeatureKit")));
}

#[test]
fn test_feature_kit_depends_on_core_kit_by_path() {
    let feature_dir = projects_dir().join("local-path-deps/FeatureKit");
    let feature = Package::from_dump_json(&read_dump("feature-kit.json")).unwrap();

    let local = feature.local_dependencies(&feature_dir);
    assert_eq!(local.len(), 1);
    let (dependency, path) = &local[0];
    assert!(dependency.matches("CoreKit"));
    assert!(path.ends_with("../CoreKit"));
    assert!(manifest_declares_product(path, "CoreKit"));
    assert!(feature.consistency_warnings().is_empty());
}

#[test]
fn test_hello_spm_depends_on_alamofire_from_5_8_0() {
    let hello = Package::from_dump_json(&read_dump("hello-spm.json")).unwrap();
    let dependency = hello.dependency("alamofire").expect("alamofire dependency");

    match dependency {
        PackageDependency::Remote { url, requirement, .. } => {
            assert_eq!(url, "https://github.com/Alamofire/Alamofire.git");
            assert_eq!(requirement.minimum_version(), Some("5.8.0"));
        }
        other => panic!("expected a remote dependency, got {other:?}"),
    }

    let manifest = fs::read_to_string(projects_dir().join("hello-spm/Package.swift")).unwrap();
    assert!(manifest.contains(r#"from: "5.8.0""#));
}

#[test]
fn test_fixture_manifests_are_consistent() {
    for name in ["app.json", "feature-kit.json", "core-kit.json", "hello-spm.json"] {
        let package = Package::from_dump_json(&read_dump(name)).unwrap();
        assert!(
            package.consistency_warnings().is_empty(),
            "{name}: {:?}",
            package.consistency_warnings()
        );
    }
}
