/// Targets of an Xcode project with their SwiftPM product dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XcodeProject {
    pub targets: Vec<XcodeTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XcodeTarget {
    /// pbxproj object ID
    pub id: String,
    pub name: String,
    /// e.g. `com.apple.product-type.application`
    pub product_type: String,
    /// Object IDs of targets this target depends on
    pub target_depends_on: Vec<String>,
    /// Swift package products linked into the target
    pub products: Vec<PackageProduct>,
}

impl XcodeTarget {
    /// Unit test and UI test bundles
    pub fn is_test(&self) -> bool {
        self.product_type.contains("unit-test") || self.product_type.contains("ui-testing")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageProduct {
    pub name: String,
    /// Identity of the package reference; empty when unknown
    pub package_identity: String,
}
