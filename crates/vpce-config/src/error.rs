use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Stack file not found. Looked for:\n\
        - current directory: stack.local.kdl, stack.kdl\n\
        - ./.vpce/ directory\n\
        or set VPCE_STACK_PATH to point at one"
    )]
    StackFileNotFound,

    #[error("Invalid settings file: {path}\nreason: {message}")]
    InvalidSettings { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
