// swift-deps-diagram
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::graph::{Edge, EdgeKind, Graph, Node, NodeKind};
pub use models::options::{DiagramOptions, Mode, OutputFormat};
pub use services::pipeline::{Pipeline, RunSummary};
pub use utils::error::{DiagramError, ErrorKind, Result};
