// Models module for data structures
pub mod bazel;
pub mod graph;
pub mod manifest;
pub mod options;
pub mod xcode;
