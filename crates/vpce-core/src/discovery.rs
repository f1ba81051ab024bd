//! Project root discovery
//!
//! A project is a directory holding `stack.kdl` (or `.vpce/stack.kdl`).

use crate::error::{Result, StackError};
use crate::model::StackSpec;
use crate::parser::parse_kdl_file;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STACK_FILE: &str = "stack.kdl";
const HIDDEN_STACK_FILE: &str = ".vpce/stack.kdl";

/// Locate the project root
///
/// Search order:
/// 1. `VPCE_PROJECT_ROOT`
/// 2. the current directory and its ancestors, looking for `stack.kdl`
///    or `.vpce/stack.kdl`
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("VPCE_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking VPCE_PROJECT_ROOT");
        if stack_file_in(&path).is_some() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    let start_dir = std::env::current_dir()?;
    let mut current = start_dir.clone();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        if stack_file_in(&current).is_some() {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }

        if !current.pop() {
            break;
        }
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(StackError::ProjectRootNotFound(start_dir))
}

/// The stack file inside a project root, if there is one
pub fn stack_file_in(root: &Path) -> Option<PathBuf> {
    [STACK_FILE, HIDDEN_STACK_FILE]
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the stack definition of a project root
#[tracing::instrument(skip(project_root), fields(project_root = %project_root.display()))]
pub fn load_project(project_root: &Path) -> Result<StackSpec> {
    let file = stack_file_in(project_root)
        .ok_or_else(|| StackError::ProjectRootNotFound(project_root.to_path_buf()))?;
    info!(file = %file.display(), "Loading stack definition");
    parse_kdl_file(file)
}
