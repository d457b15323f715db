use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::models::manifest::repository_name;
use crate::models::xcode::{PackageProduct, XcodeProject, XcodeTarget};
use crate::services::command_runner::{run_checked, CommandRunner, Invocation};
use crate::utils::error::{DiagramError, ErrorKind, Result};

pub const PARSE_TIMEOUT: Duration = Duration::from_secs(30);

type Objects = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct PbxRoot {
    #[serde(default)]
    objects: Option<Objects>,
}

/// Parse an `.xcodeproj` into its targets, target dependencies and package products.
///
/// `project.pbxproj` is an old-style plist; `plutil` converts it to JSON.
pub async fn load_project(runner: &dyn CommandRunner, xcodeproj_path: &Path) -> Result<XcodeProject> {
    if runner.find_program("plutil").is_none() {
        return Err(DiagramError::new(
            ErrorKind::XcodeParse,
            "plutil binary not found in PATH",
        ));
    }
    if xcodeproj_path.extension().and_then(|e| e.to_str()) != Some("xcodeproj") {
        return Err(DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            "xcode project path must end with .xcodeproj",
        ));
    }
    if !xcodeproj_path.exists() {
        return Err(DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            format!("xcode project not found at {}", xcodeproj_path.display()),
        ));
    }
    let pbxproj_path = xcodeproj_path.join("project.pbxproj");
    if !pbxproj_path.exists() {
        return Err(DiagramError::new(
            ErrorKind::XcodeProjectNotFound,
            format!("project.pbxproj not found at {}", pbxproj_path.display()),
        ));
    }

    let invocation = Invocation::new(
        "plutil",
        [
            "-convert".to_string(),
            "json".to_string(),
            "-o".to_string(),
            "-".to_string(),
            pbxproj_path.display().to_string(),
        ],
        PARSE_TIMEOUT,
    );
    let output = run_checked(runner, &invocation, ErrorKind::XcodeParse, "plutil -convert json").await?;

    let root: PbxRoot = serde_json::from_slice(&output.stdout).map_err(|e| {
        DiagramError::new(ErrorKind::XcodeParse, "failed to decode plutil JSON output").with_source(e)
    })?;

    Ok(root.objects.as_ref().map(project_from_objects).unwrap_or_default())
}

fn isa(object: &Value) -> &str {
    str_field(object, "isa")
}

fn str_field<'a>(object: &'a Value, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn str_list<'a>(object: &'a Value, key: &str) -> Vec<&'a str> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

fn project_from_objects(objects: &Objects) -> XcodeProject {
    // PBXTargetDependency id -> target id, or -> proxy id when only a proxy is recorded
    let mut dependency_targets: HashMap<&str, &str> = HashMap::new();
    let mut dependency_proxies: HashMap<&str, &str> = HashMap::new();
    let mut proxy_remotes: HashMap<&str, &str> = HashMap::new();
    let mut package_refs: HashMap<&str, String> = HashMap::new();

    for (id, object) in objects {
        match isa(object) {
            "PBXTargetDependency" => {
                let target = str_field(object, "target");
                if !target.is_empty() {
                    dependency_targets.insert(id, target);
                }
                let proxy = str_field(object, "targetProxy");
                if !proxy.is_empty() {
                    dependency_proxies.insert(id, proxy);
                }
            }
            "PBXContainerItemProxy" => {
                let remote = str_field(object, "remoteGlobalIDString");
                if !remote.is_empty() {
                    proxy_remotes.insert(id, remote);
                }
            }
            "XCRemoteSwiftPackageReference" => {
                let identity = match str_field(object, "identity") {
                    "" => repository_name(str_field(object, "repositoryURL")).to_string(),
                    identity => identity.to_string(),
                };
                package_refs.insert(id, identity);
            }
            "XCLocalSwiftPackageReference" => {
                let local = [str_field(object, "relativePath"), str_field(object, "path")]
                    .into_iter()
                    .find(|p| !p.is_empty())
                    .unwrap_or(id);
                package_refs.insert(id, file_name(local));
            }
            _ => {}
        }
    }

    let mut product_deps: HashMap<&str, PackageProduct> = HashMap::new();
    for (id, object) in objects {
        if isa(object) != "XCSwiftPackageProductDependency" {
            continue;
        }
        let package_identity = package_refs
            .get(str_field(object, "package"))
            .cloned()
            .unwrap_or_default();
        product_deps.insert(
            id,
            PackageProduct {
                name: str_field(object, "productName").to_string(),
                package_identity,
            },
        );
    }

    let mut targets = Vec::new();
    for (id, object) in objects {
        if !matches!(
            isa(object),
            "PBXNativeTarget" | "PBXAggregateTarget" | "PBXLegacyTarget"
        ) {
            continue;
        }

        let mut target = XcodeTarget {
            id: id.clone(),
            name: str_field(object, "name").to_string(),
            product_type: str_field(object, "productType").to_string(),
            ..XcodeTarget::default()
        };

        for dep_id in str_list(object, "dependencies") {
            let resolved = dependency_targets.get(dep_id).copied().or_else(|| {
                dependency_proxies
                    .get(dep_id)
                    .and_then(|proxy| proxy_remotes.get(proxy))
                    .copied()
            });
            if let Some(target_id) = resolved {
                target.target_depends_on.push(target_id.to_string());
            }
        }

        for product_id in str_list(object, "packageProductDependencies") {
            if let Some(product) = product_deps.get(product_id) {
                if !product.name.is_empty() {
                    target.products.push(product.clone());
                }
            }
        }

        targets.push(target);
    }

    targets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    XcodeProject { targets }
}
