use std::path::PathBuf;

/// Rule targets discovered in a Bazel workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BazelWorkspace {
    pub path: PathBuf,
    /// Query scope the targets were collected from, e.g. `//...`
    pub scope: String,
    pub targets: Vec<BazelTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BazelTarget {
    pub label: String,
    /// Rule kind such as `swift_library`
    pub kind: String,
    /// Direct rule dependencies, sorted and unique
    pub deps: Vec<String>,
}

impl BazelTarget {
    pub fn is_test(&self) -> bool {
        is_test_rule_kind(&self.kind)
    }
}

pub fn is_test_rule_kind(kind: &str) -> bool {
    kind.ends_with("_test")
}
