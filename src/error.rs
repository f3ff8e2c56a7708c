//! Error types for loading declarations and prebuilt schemas

use thiserror::Error;

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Loading errors. Building and validating never fail; only reading inputs does.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },

    #[error("node {owner} references missing node {target}")]
    DanglingNode { owner: usize, target: usize },

    #[error("duplicate declaration `{name}` in {file}")]
    DuplicateDeclaration { name: String, file: String },
}
