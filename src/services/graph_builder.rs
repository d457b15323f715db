use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::bazel::{is_test_rule_kind, BazelWorkspace};
use crate::models::graph::{Edge, EdgeKind, Graph, Node, NodeKind};
use crate::models::manifest::{Package, Target, TargetDependency};
use crate::models::xcode::XcodeProject;

pub fn target_node_id(name: &str) -> String {
    format!("target::{name}")
}

/// Node ID of a package product, qualified by its package when known
pub fn product_node_id(name: &str, package: Option<&str>) -> String {
    match package {
        Some(package) if !package.is_empty() => format!("pkg::{package}::{name}"),
        _ => format!("product::{name}"),
    }
}

pub fn by_name_node_id(name: &str) -> String {
    format!("name::{name}")
}

pub fn external_node_id(label: &str) -> String {
    format!("external::{label}")
}

/// Accumulates nodes and de-duplicated edges
#[derive(Debug, Default)]
struct GraphBuilder {
    graph: Graph,
    edge_keys: HashSet<String>,
}

impl GraphBuilder {
    /// First insertion of an ID wins
    fn add_node(&mut self, id: &str, label: &str, kind: NodeKind) {
        if !self.graph.nodes.contains_key(id) {
            self.graph.insert_node(Node::new(id, label, kind));
        }
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let edge = Edge::new(from, to, kind);
        if self.edge_keys.insert(edge.key()) {
            self.graph.edges.push(edge);
        }
    }

    fn finish(mut self) -> Graph {
        self.graph.edges = self.graph.sorted_edges();
        self.graph
    }
}

fn include_target(target: &Target, include_tests: bool) -> bool {
    include_tests || !target.kind.is_test()
}

/// Target dependency graph of a Swift package
pub fn build_package_graph(package: &Package, include_tests: bool) -> Graph {
    let mut builder = GraphBuilder::default();
    let included: Vec<&Target> = package
        .targets
        .iter()
        .filter(|t| include_target(t, include_tests))
        .collect();
    let local: BTreeSet<&str> = included.iter().map(|t| t.name.as_str()).collect();

    for target in &included {
        builder.add_node(&target_node_id(&target.name), &target.name, NodeKind::Target);
    }

    for target in &included {
        let from = target_node_id(&target.name);
        for dep in &target.dependencies {
            match dep {
                TargetDependency::Target { name } if !name.is_empty() => {
                    let to = if local.contains(name.as_str()) {
                        target_node_id(name)
                    } else {
                        let id = product_node_id(name, None);
                        builder.add_node(&id, name, NodeKind::ExternalProduct);
                        id
                    };
                    builder.add_edge(&from, &to, EdgeKind::Target);
                }
                TargetDependency::Product { name, package } if !name.is_empty() => {
                    let to = product_node_id(name, package.as_deref());
                    builder.add_node(&to, name, NodeKind::ExternalProduct);
                    builder.add_edge(&from, &to, EdgeKind::Product);
                }
                TargetDependency::ByName { name } if !name.is_empty() => {
                    let to = if local.contains(name.as_str()) {
                        target_node_id(name)
                    } else {
                        let id = by_name_node_id(name);
                        builder.add_node(&id, name, NodeKind::ExternalProduct);
                        id
                    };
                    builder.add_edge(&from, &to, EdgeKind::ByName);
                }
                _ => {}
            }
        }
    }

    builder.finish()
}

/// Target graph of an Xcode project.
///
/// Targets sharing a name keep the plain ID for the first (by object ID) and get
/// the object ID appended otherwise.
pub fn build_xcode_graph(project: &XcodeProject, include_tests: bool) -> Graph {
    let mut builder = GraphBuilder::default();
    let mut targets: Vec<_> = project.targets.iter().collect();
    targets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut node_ids: HashMap<&str, String> = HashMap::new();
    for target in &targets {
        if target.name.is_empty() || (!include_tests && target.is_test()) {
            continue;
        }
        let mut id = target_node_id(&target.name);
        if builder.graph.nodes.contains_key(&id) {
            id = format!("{id}::{}", target.id);
        }
        builder.add_node(&id, &target.name, NodeKind::Target);
        node_ids.insert(target.id.as_str(), id);
    }

    for target in &targets {
        let Some(from) = node_ids.get(target.id.as_str()).cloned() else {
            continue;
        };
        for dep_id in &target.target_depends_on {
            if let Some(to) = node_ids.get(dep_id.as_str()) {
                builder.add_edge(&from, to, EdgeKind::Target);
            }
        }
        for product in &target.products {
            if product.name.is_empty() {
                continue;
            }
            let to = product_node_id(&product.name, Some(product.package_identity.as_str()));
            builder.add_node(&to, &product.name, NodeKind::ExternalProduct);
            builder.add_edge(&from, &to, EdgeKind::Product);
        }
    }

    builder.finish()
}

/// Rule graph of a Bazel workspace; `@repo//...` labels become external nodes
pub fn build_bazel_graph(workspace: &BazelWorkspace, include_tests: bool) -> Graph {
    let mut builder = GraphBuilder::default();
    let mut targets: Vec<_> = workspace.targets.iter().collect();
    targets.sort_by(|a, b| a.label.cmp(&b.label));

    let kinds: HashMap<&str, &str> = targets
        .iter()
        .map(|t| (t.label.as_str(), t.kind.as_str()))
        .collect();
    let mut included = HashSet::new();

    for target in &targets {
        if target.label.is_empty() || (!include_tests && target.is_test()) {
            continue;
        }
        included.insert(target.label.as_str());
        builder.add_node(&target_node_id(&target.label), &target.label, NodeKind::Target);
    }

    for target in &targets {
        if !included.contains(target.label.as_str()) {
            continue;
        }
        let from = target_node_id(&target.label);
        let mut deps: Vec<&String> = target.deps.iter().collect();
        deps.sort();

        for dep in deps {
            if dep.starts_with('@') {
                let to = external_node_id(dep);
                builder.add_node(&to, dep, NodeKind::ExternalProduct);
                builder.add_edge(&from, &to, EdgeKind::Product);
            } else if dep.starts_with("//") {
                let known_test = kinds.get(dep.as_str()).is_some_and(|kind| is_test_rule_kind(kind));
                if known_test && !include_tests {
                    continue;
                }
                let to = target_node_id(dep);
                builder.add_node(&to, dep, NodeKind::Target);
                builder.add_edge(&from, &to, EdgeKind::Target);
            }
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bazel::BazelTarget;
    use crate::models::manifest::TargetKind;
    use crate::models::xcode::{PackageProduct, XcodeTarget};
    use std::path::Path;

    fn fixture_package(name: &str) -> Package {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/dumps")
            .join(name);
        Package::from_dump_json(&std::fs::read(path).unwrap()).unwrap()
    }

    fn has_edge(graph: &Graph, from: &str, to: &str, kind: EdgeKind) -> bool {
        graph.edges.contains(&Edge::new(from, to, kind))
    }

    #[test]
    fn test_package_local_target_dependencies() {
        let graph = build_package_graph(&fixture_package("simple-local.json"), false);
        assert!(graph.node("target::App").is_some());
        assert!(graph.node("target::Core").is_some());
        assert!(has_edge(&graph, "target::App", "target::Core", EdgeKind::Target));
    }

    #[test]
    fn test_package_product_dependencies() {
        let graph = build_package_graph(&fixture_package("product-and-byname.json"), false);
        let node = graph.node("pkg::alamofire::Alamofire").expect("product node");
        assert_eq!(node.kind, NodeKind::ExternalProduct);
        assert_eq!(node.label, "Alamofire");
    }

    #[test]
    fn test_package_by_name_resolution() {
        let graph = build_package_graph(&fixture_package("product-and-byname.json"), false);
        assert!(has_edge(&graph, "target::App", "target::Core", EdgeKind::ByName));
        assert!(has_edge(&graph, "target::App", "name::SomeExternal", EdgeKind::ByName));
        assert_eq!(graph.node("name::SomeExternal").unwrap().kind, NodeKind::ExternalProduct);
    }

    #[test]
    fn test_package_target_dependency_outside_package_becomes_product() {
        let package = Package {
            name: "P".to_string(),
            targets: vec![Target {
                name: "App".to_string(),
                kind: TargetKind::Executable,
                dependencies: vec![TargetDependency::target("Elsewhere")],
            }],
            ..Package::default()
        };
        let graph = build_package_graph(&package, false);
        assert!(has_edge(&graph, "target::App", "product::Elsewhere", EdgeKind::Target));
    }

    #[test]
    fn test_package_exclude_and_include_tests() {
        let package = fixture_package("product-and-byname.json");
        let without = build_package_graph(&package, false);
        assert!(without.node("target::AppTests").is_none());
        let with = build_package_graph(&package, true);
        assert!(with.node("target::AppTests").is_some());
    }

    #[test]
    fn test_package_deduplicates_edges() {
        let package = Package {
            name: "Sample".to_string(),
            targets: vec![
                Target {
                    name: "App".to_string(),
                    kind: TargetKind::Regular,
                    dependencies: vec![TargetDependency::target("Core"), TargetDependency::target("Core")],
                },
                Target {
                    name: "Core".to_string(),
                    ..Target::default()
                },
            ],
            ..Package::default()
        };
        let graph = build_package_graph(&package, false);
        let count = graph
            .edges
            .iter()
            .filter(|e| e.from == "target::App" && e.to == "target::Core")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_package_skips_empty_names() {
        let package = Package {
            name: "P".to_string(),
            targets: vec![Target {
                name: "App".to_string(),
                kind: TargetKind::Regular,
                dependencies: vec![
                    TargetDependency::by_name(""),
                    TargetDependency::product("", Some("x")),
                    TargetDependency::Unknown,
                ],
            }],
            ..Package::default()
        };
        let graph = build_package_graph(&package, false);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_package_deterministic_ordering() {
        let package = fixture_package("product-and-byname.json");
        let a = build_package_graph(&package, true);
        let b = build_package_graph(&package, true);
        assert_eq!(a, b);
        assert_eq!(a.edges, a.sorted_edges());
    }

    fn xcode_target(id: &str, name: &str, product_type: &str, deps: &[&str]) -> XcodeTarget {
        XcodeTarget {
            id: id.to_string(),
            name: name.to_string(),
            product_type: product_type.to_string(),
            target_depends_on: deps.iter().map(|d| (*d).to_string()).collect(),
            products: Vec::new(),
        }
    }

    #[test]
    fn test_xcode_target_and_product_edges() {
        let mut app = xcode_target("A", "App", "com.apple.product-type.application", &["C", "MISSING"]);
        app.products = vec![
            PackageProduct {
                name: "Alamofire".to_string(),
                package_identity: "Alamofire".to_string(),
            },
            PackageProduct {
                name: "Loose".to_string(),
                package_identity: String::new(),
            },
        ];
        let project = XcodeProject {
            targets: vec![app, xcode_target("C", "Core", "com.apple.product-type.framework", &[])],
        };

        let graph = build_xcode_graph(&project, false);
        assert!(has_edge(&graph, "target::App", "target::Core", EdgeKind::Target));
        assert!(has_edge(&graph, "target::App", "pkg::Alamofire::Alamofire", EdgeKind::Product));
        assert!(has_edge(&graph, "target::App", "product::Loose", EdgeKind::Product));
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_xcode_respects_include_tests() {
        let project = XcodeProject {
            targets: vec![
                xcode_target("A", "App", "com.apple.product-type.application", &[]),
                xcode_target("T", "AppTests", "com.apple.product-type.bundle.unit-test", &["A"]),
                xcode_target("U", "AppUITests", "com.apple.product-type.bundle.ui-testing", &["A"]),
            ],
        };
        let without = build_xcode_graph(&project, false);
        assert_eq!(without.nodes.len(), 1);
        assert!(without.edges.is_empty());

        let with = build_xcode_graph(&project, true);
        assert_eq!(with.nodes.len(), 3);
        assert!(has_edge(&with, "target::AppTests", "target::App", EdgeKind::Target));
    }

    #[test]
    fn test_xcode_disambiguates_duplicate_names() {
        let project = XcodeProject {
            targets: vec![
                xcode_target("B", "Widget", "com.apple.product-type.app-extension", &[]),
                xcode_target("A", "Widget", "com.apple.product-type.framework", &[]),
                xcode_target("Z", "", "", &[]),
            ],
        };
        let graph = build_xcode_graph(&project, false);
        assert!(graph.node("target::Widget").is_some());
        assert!(graph.node("target::Widget::B").is_some());
        assert_eq!(graph.nodes.len(), 2);
    }

    fn bazel_target(label: &str, kind: &str, deps: &[&str]) -> BazelTarget {
        BazelTarget {
            label: label.to_string(),
            kind: kind.to_string(),
            deps: deps.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    fn sample_workspace() -> BazelWorkspace {
        BazelWorkspace {
            path: "/tmp/ws".into(),
            scope: "//...".to_string(),
            targets: vec![
                bazel_target("//app:cli", "swift_binary", &["//app:lib", "@swift_argument_parser//:ArgumentParser"]),
                bazel_target("//app:lib", "swift_library", &["//third_party:outside", "@swift_argument_parser//:ArgumentParser"]),
                bazel_target("//app:lib_test", "swift_test", &["//app:lib"]),
                bazel_target("//app:tool", "genrule", &["//app:lib_test"]),
            ],
        }
    }

    #[test]
    fn test_bazel_maps_local_and_external_deps() {
        let graph = build_bazel_graph(&sample_workspace(), false);
        assert!(has_edge(&graph, "target:://app:cli", "target:://app:lib", EdgeKind::Target));
        assert!(has_edge(
            &graph,
            "target:://app:cli",
            "external::@swift_argument_parser//:ArgumentParser",
            EdgeKind::Product
        ));
        let outside = graph.node("target:://third_party:outside").expect("out-of-scope target");
        assert_eq!(outside.kind, NodeKind::Target);
        let external = graph.node("external::@swift_argument_parser//:ArgumentParser").unwrap();
        assert_eq!(external.kind, NodeKind::ExternalProduct);
    }

    #[test]
    fn test_bazel_respects_include_tests() {
        let without = build_bazel_graph(&sample_workspace(), false);
        assert!(without.node("target:://app:lib_test").is_none());
        assert!(!without.edges.iter().any(|e| e.to == "target:://app:lib_test"));

        let with = build_bazel_graph(&sample_workspace(), true);
        assert!(with.node("target:://app:lib_test").is_some());
        assert!(has_edge(&with, "target:://app:tool", "target:://app:lib_test", EdgeKind::Target));
    }

    #[test]
    fn test_bazel_deterministic_and_deduped() {
        let mut workspace = sample_workspace();
        workspace.targets.reverse();
        workspace.targets[0].deps.push("//app:lib_test".to_string());
        let a = build_bazel_graph(&workspace, true);
        let b = build_bazel_graph(&sample_workspace(), true);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.edges, a.sorted_edges());
        let tool_edges = a.edges.iter().filter(|e| e.from == "target:://app:tool").count();
        assert_eq!(tool_edges, 1);
    }
}
