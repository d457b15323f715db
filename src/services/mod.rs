// Services module for loading projects and producing diagrams
pub mod bazel_query;
pub mod command_runner;
pub mod graph_builder;
pub mod graphviz;
pub mod input_resolver;
pub mod pipeline;
pub mod render;
pub mod swiftpm;
pub mod tuist;
pub mod xcode_project;
