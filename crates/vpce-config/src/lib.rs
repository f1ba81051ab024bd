pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{OutputFormat, Settings};

use std::path::PathBuf;

/// Environment variable pointing directly at a stack file
pub const STACK_PATH_ENV: &str = "VPCE_STACK_PATH";

/// Environment variable overriding the settings directory
pub const CONFIG_DIR_ENV: &str = "VPCE_CONFIG_DIR";

/// Directory holding the user's `config.yaml`
///
/// `VPCE_CONFIG_DIR` wins over the platform config directory
/// (`~/.config/vpce` on Linux).
pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("vpce");
    Ok(config_dir)
}

/// Find the stack file for the current directory
///
/// Search order:
/// 1. `VPCE_STACK_PATH` (if the file exists)
/// 2. current directory: `stack.local.kdl`, `stack.kdl`
/// 3. `./.vpce/`: same order
pub fn find_stack_file() -> Result<PathBuf> {
    if let Ok(stack_path) = std::env::var(STACK_PATH_ENV) {
        let path = PathBuf::from(stack_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at a missing file: {}", STACK_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    let candidates = ["stack.local.kdl", "stack.kdl"];

    for filename in &candidates {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let vpce_dir = current_dir.join(".vpce");
    if vpce_dir.is_dir() {
        for filename in &candidates {
            let path = vpce_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(ConfigError::StackFileNotFound)
}
