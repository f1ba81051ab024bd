//! Template synthesis error types

use std::path::PathBuf;
use thiserror::Error;

/// Synthesis and assembly errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Stack(#[from] vpce_core::StackError),

    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    #[error("Assembly error: {path}\nreason: {message}")]
    Assembly { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
