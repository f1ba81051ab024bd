use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error: {path}\nreason: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid CIDR block '{0}'")]
    InvalidCidr(String),

    #[error("CIDR block {cidr} has no room for a /{mask} subnet (subnet #{index})")]
    CidrExhausted { cidr: String, mask: u8, index: usize },

    #[error(
        "Project root not found\nsearched from: {0}\nhint: run inside a directory containing stack.kdl"
    )]
    ProjectRootNotFound(PathBuf),

    #[error("Load balancer not declared: {0}")]
    UnknownLoadBalancer(String),

    #[error("Service '{0}' declares no containers")]
    NoContainers(String),
}

pub type Result<T> = std::result::Result<T, StackError>;
