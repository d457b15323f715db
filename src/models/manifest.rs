use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::utils::error::{DiagramError, ErrorKind, Result};

/// A Swift package as reported by `swift package dump-package`.
///
/// Only the subset needed to draw diagrams is kept; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Package {
    /// Package name
    #[serde(default)]
    pub name: String,
    /// Products the package vends
    #[serde(default, deserialize_with = "nullable_list")]
    pub products: Vec<Product>,
    /// Package-level dependencies (remote or local)
    #[serde(default, deserialize_with = "nullable_list")]
    pub dependencies: Vec<PackageDependency>,
    /// Targets declared by the package
    #[serde(default, deserialize_with = "nullable_list")]
    pub targets: Vec<Target>,
}

/// A product vended by a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub name: String,
    /// Product kind, decoded from the `type` object
    #[serde(rename = "type", default, deserialize_with = "product_kind")]
    pub kind: ProductKind,
    /// Names of the targets bundled into this product
    #[serde(default, deserialize_with = "nullable_list")]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProductKind {
    Executable,
    #[default]
    Library,
    Plugin,
    Other(String),
}

/// Kind of a target as written in dump-package output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Executable,
    #[default]
    Regular,
    Test,
    Plugin,
    Macro,
    System,
    Binary,
    #[serde(other)]
    Other,
}

impl TargetKind {
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Test)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: TargetKind,
    #[serde(default, deserialize_with = "nullable_list")]
    pub dependencies: Vec<TargetDependency>,
}

/// A reference from a target to something it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDependency {
    /// Another target in the same package
    Target { name: String },
    /// A product, optionally qualified by the package providing it
    Product { name: String, package: Option<String> },
    /// A bare name: a local target if one matches, otherwise external
    ByName { name: String },
    /// Anything this tool does not understand
    Unknown,
}

impl TargetDependency {
    pub fn target(name: impl Into<String>) -> Self {
        Self::Target { name: name.into() }
    }

    pub fn product(name: impl Into<String>, package: Option<&str>) -> Self {
        Self::Product {
            name: name.into(),
            package: package.map(str::to_string),
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::ByName { name: name.into() }
    }

    /// Referenced name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Target { name } | Self::Product { name, .. } | Self::ByName { name } => {
                Some(name.as_str())
            }
            Self::Unknown => None,
        }
    }
}

impl<'de> Deserialize<'de> for TargetDependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = HashMap::<String, Value>::deserialize(deserializer)?;

        if let Some(value) = raw.get("target") {
            return Ok(Self::Target {
                name: single_name(value),
            });
        }
        if let Some(value) = raw.get("product") {
            let (name, package) = product_reference(value);
            return Ok(Self::Product { name, package });
        }
        if let Some(value) = raw.get("byName") {
            return Ok(Self::ByName {
                name: single_name(value),
            });
        }
        Ok(Self::Unknown)
    }
}

/// Version requirement of a remote dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
    /// Half-open range; `from: "x.y.z"` in a manifest is a range up to the next major
    Range { lower: String, upper: Option<String> },
    Exact(String),
    Branch(String),
    Revision(String),
    Unspecified,
}

impl VersionRequirement {
    /// Minimum version allowed by this requirement
    pub fn minimum_version(&self) -> Option<&str> {
        match self {
            Self::Range { lower, .. } => Some(lower.as_str()),
            Self::Exact(version) => Some(version.as_str()),
            Self::Branch(_) | Self::Revision(_) | Self::Unspecified => None,
        }
    }
}

/// A package-level dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageDependency {
    /// Fetched from a source URL with a version constraint
    Remote {
        identity: String,
        url: String,
        requirement: VersionRequirement,
    },
    /// Read from a filesystem path
    Local {
        identity: String,
        name: Option<String>,
        path: String,
    },
    Unknown,
}

impl PackageDependency {
    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Remote { identity, .. } | Self::Local { identity, .. } => Some(identity.as_str()),
            Self::Unknown => None,
        }
    }

    /// Whether `reference` names this dependency, by identity or explicit name.
    ///
    /// Identities are lowercase, references in manifests usually are not.
    pub fn matches(&self, reference: &str) -> bool {
        match self {
            Self::Remote { identity, .. } => identity.eq_ignore_ascii_case(reference),
            Self::Local { identity, name, .. } => {
                identity.eq_ignore_ascii_case(reference)
                    || name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(reference))
            }
            Self::Unknown => false,
        }
    }

    /// Directory of a local dependency, relative paths resolved against `package_root`
    pub fn local_path(&self, package_root: &Path) -> Option<PathBuf> {
        match self {
            Self::Local { path, .. } => {
                let path = Path::new(path);
                Some(if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    package_root.join(path)
                })
            }
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for PackageDependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(decode_package_dependency(&raw))
    }
}

fn decode_package_dependency(raw: &Value) -> PackageDependency {
    if let Some(entry) = first_element(raw.get("sourceControl")) {
        let url = entry
            .pointer("/location/remote/0")
            .map(|remote| match remote {
                Value::String(s) => s.clone(),
                other => string_field(other, "urlString"),
            })
            .unwrap_or_default();
        let identity = non_empty(string_field(entry, "identity"))
            .unwrap_or_else(|| identity_from_url(&url));
        return PackageDependency::Remote {
            identity,
            url,
            requirement: decode_requirement(entry.get("requirement")),
        };
    }

    if let Some(entry) = first_element(raw.get("fileSystem")) {
        let path = string_field(entry, "path");
        let name = non_empty(string_field(entry, "nameForTargetDependencyResolutionOnly"))
            .or_else(|| non_empty(string_field(entry, "name")));
        let identity = non_empty(string_field(entry, "identity"))
            .unwrap_or_else(|| identity_from_path(&path));
        return PackageDependency::Local { identity, name, path };
    }

    // Older dump-package output and hand-written fixtures
    if let Some(url) = raw.get("url").and_then(Value::as_str) {
        return PackageDependency::Remote {
            identity: non_empty(string_field(raw, "identity"))
                .unwrap_or_else(|| identity_from_url(url)),
            url: url.to_string(),
            requirement: decode_requirement(raw.get("requirement")),
        };
    }
    if let Some(path) = raw.get("path").and_then(Value::as_str) {
        return PackageDependency::Local {
            identity: non_empty(string_field(raw, "identity"))
                .unwrap_or_else(|| identity_from_path(path)),
            name: non_empty(string_field(raw, "name")),
            path: path.to_string(),
        };
    }

    PackageDependency::Unknown
}

fn decode_requirement(raw: Option<&Value>) -> VersionRequirement {
    let Some(raw) = raw else {
        return VersionRequirement::Unspecified;
    };
    if let Some(range) = first_element(raw.get("range")) {
        let lower = string_field(range, "lowerBound");
        if !lower.is_empty() {
            return VersionRequirement::Range {
                lower,
                upper: non_empty(string_field(range, "upperBound")),
            };
        }
    }
    if let Some(from) = raw.get("from").and_then(Value::as_str) {
        return VersionRequirement::Range {
            lower: from.to_string(),
            upper: None,
        };
    }
    for key in ["exact", "branch", "revision"] {
        let Some(value) = raw.get(key) else {
            continue;
        };
        let value = match value {
            Value::String(s) => s.clone(),
            other => first_element(Some(other))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        if value.is_empty() {
            continue;
        }
        return match key {
            "exact" => VersionRequirement::Exact(value),
            "branch" => VersionRequirement::Branch(value),
            _ => VersionRequirement::Revision(value),
        };
    }
    VersionRequirement::Unspecified
}

/// Last path segment of a repository URL without `.git`, case preserved
pub fn repository_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}

/// SwiftPM package identity derived from a repository URL
pub fn identity_from_url(url: &str) -> String {
    repository_name(url).to_lowercase()
}

fn identity_from_path(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_lowercase()
}

fn first_element(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Name from a `target`/`byName` value: a string, the first non-empty string of
/// an array, or an object's `name`.
fn single_name(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
        Value::Object(_) => string_field(raw, "name"),
        _ => String::new(),
    }
}

/// `(name, package)` from a `product` value
fn product_reference(raw: &Value) -> (String, Option<String>) {
    match raw {
        Value::String(s) => (s.clone(), None),
        Value::Array(items) => {
            let name = items.first().and_then(Value::as_str).unwrap_or_default();
            let package = items.get(1).and_then(Value::as_str).map(str::to_string);
            (name.to_string(), package.and_then(non_empty))
        }
        Value::Object(_) => (
            string_field(raw, "name"),
            non_empty(string_field(raw, "package")),
        ),
        _ => (String::new(), None),
    }
}

fn product_kind<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<ProductKind, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let key = match &raw {
        Value::String(s) => s.clone(),
        Value::Object(map) => map.keys().next().cloned().unwrap_or_default(),
        _ => String::new(),
    };
    Ok(match key.as_str() {
        "executable" => ProductKind::Executable,
        "library" | "" => ProductKind::Library,
        "plugin" => ProductKind::Plugin,
        _ => ProductKind::Other(key),
    })
}

fn nullable_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Package {
    /// Decode dump-package JSON into a typed package
    pub fn from_dump_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| {
            DiagramError::new(ErrorKind::ManifestDecode, "failed to decode dump-package output")
                .with_source(e)
        })
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn dependency(&self, reference: &str) -> Option<&PackageDependency> {
        self.dependencies.iter().find(|d| d.matches(reference))
    }

    /// Local-path dependencies with their directories resolved against `package_root`
    pub fn local_dependencies(&self, package_root: &Path) -> Vec<(&PackageDependency, PathBuf)> {
        self.dependencies
            .iter()
            .filter_map(|dep| dep.local_path(package_root).map(|path| (dep, path)))
            .collect()
    }

    /// Check the conventions manifests are expected to follow.
    ///
    /// Returns one message per violation; an empty list means the manifest is
    /// internally consistent.
    pub fn consistency_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let target_names: BTreeSet<&str> = self.targets.iter().map(|t| t.name.as_str()).collect();

        for product in &self.products {
            for target in &product.targets {
                if !target_names.contains(target.as_str()) {
                    warnings.push(format!(
                        "product '{}' bundles undeclared target '{}'",
                        product.name, target
                    ));
                }
            }
        }

        for target in &self.targets {
            for dep in &target.dependencies {
                match dep {
                    TargetDependency::Target { name } if name == &target.name => {
                        warnings.push(format!("target '{}' depends on itself", target.name));
                    }
                    TargetDependency::Target { name } if !target_names.contains(name.as_str()) => {
                        warnings.push(format!(
                            "target '{}' depends on unknown target '{}'",
                            target.name, name
                        ));
                    }
                    TargetDependency::Product { name, package } => {
                        let declared = match package {
                            Some(package) => self.dependency(package).is_some(),
                            None => self.dependencies.iter().any(|d| d.matches(name)),
                        };
                        if !declared && self.product(name).is_none() {
                            warnings.push(format!(
                                "target '{}' uses product '{}' from undeclared package '{}'",
                                target.name,
                                name,
                                package.as_deref().unwrap_or(name)
                            ));
                        }
                    }
                    TargetDependency::ByName { name } => {
                        if name == &target.name {
                            warnings.push(format!("target '{}' depends on itself", target.name));
                        } else if !target_names.contains(name.as_str())
                            && self.product(name).is_none()
                            && self.dependency(name).is_none()
                        {
                            warnings.push(format!(
                                "target '{}' depends on '{}', which is neither a target nor a declared dependency",
                                target.name, name
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }

        warnings
    }
}
