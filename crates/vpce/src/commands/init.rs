use colored::Colorize;
use vpce_core::{DEFAULT_STACK_ID, StackSpec};

const STACK_FILE: &str = "stack.kdl";

pub fn handle(force: bool) -> anyhow::Result<()> {
    let path = std::env::current_dir()?.join(STACK_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let content = vpce_core::to_kdl_string(&StackSpec::producer(DEFAULT_STACK_ID));
    std::fs::write(&path, content)?;

    println!("{} {}", "✓ Created".green().bold(), path.display());
    println!("  Next: {}", "vpce synth".cyan());
    Ok(())
}
