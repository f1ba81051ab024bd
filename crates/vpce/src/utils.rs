use anyhow::Context;
use colored::Colorize;
use std::path::{Path, PathBuf};
use vpce_config::{ConfigError, Settings};
use vpce_core::{DEFAULT_STACK_ID, Diagnostic, Severity, StackSpec};

/// Stack definition together with where it came from
pub struct LoadedStack {
    pub stack: StackSpec,
    /// `None` for the built-in producer definition
    pub source: Option<PathBuf>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    Settings::load().context("failed to load settings")
}

/// Resolve and load the stack definition
///
/// `--file`, then `VPCE_STACK_PATH` and the current directory, then the
/// enclosing project root. Without any stack file the built-in producer
/// definition is used.
pub fn load_stack(
    file: Option<&Path>,
    stack_id: Option<&str>,
    settings: &Settings,
) -> anyhow::Result<LoadedStack> {
    let source = match file {
        Some(path) => Some(path.to_path_buf()),
        None => match vpce_config::find_stack_file() {
            Ok(path) => Some(path),
            Err(ConfigError::StackFileNotFound) => vpce_core::find_project_root()
                .ok()
                .and_then(|root| vpce_core::stack_file_in(&root)),
            Err(e) => return Err(e.into()),
        },
    };

    let mut stack = match &source {
        Some(path) => vpce_core::parse_kdl_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            tracing::debug!("No stack file found, using the built-in definition");
            StackSpec::producer(
                settings
                    .default_stack_id
                    .as_deref()
                    .unwrap_or(DEFAULT_STACK_ID),
            )
        }
    };
    if let Some(id) = stack_id {
        stack.id = id.to_string();
    }
    vpce_core::validate_stack_id(&stack.id)?;

    Ok(LoadedStack { stack, source })
}

/// Tell the user which definition is in use (stderr, so stdout stays clean)
pub fn print_source(loaded: &LoadedStack) {
    match &loaded.source {
        Some(path) => eprintln!("📄 {}", path.display().to_string().cyan()),
        None => eprintln!("📄 {}", "built-in producer stack".cyan()),
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        eprintln!(
            "{}: {}: {}",
            label,
            diagnostic.subject.cyan(),
            diagnostic.message
        );
    }
}
