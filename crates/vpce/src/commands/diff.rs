use crate::utils;
use colored::Colorize;
use std::path::{Path, PathBuf};
use vpce_template::{ActionType, Assembly};

pub async fn handle(
    file: Option<&Path>,
    stack_id: Option<String>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let settings = utils::load_settings()?;
    let loaded = utils::load_stack(file, stack_id.as_deref(), &settings)?;
    utils::print_source(&loaded);

    let stack = &loaded.stack;
    let desired = vpce_template::synthesize(stack)?;

    let out = out.unwrap_or(settings.output_dir);
    let previous = Assembly::new(&out).read_template(&stack.id).await?;
    if previous.is_none() {
        println!(
            "{}",
            format!("No previous template for {} in {}", stack.id, out.display()).yellow()
        );
    }

    let plan = vpce_template::plan(previous.as_ref(), &desired);
    if !plan.has_changes {
        println!("{}", "✓ No changes".green().bold());
        return Ok(());
    }

    for action in &plan.actions {
        let line = format!("{} ({})", action.logical_id, action.resource_type);
        match action.action_type {
            ActionType::Create => println!("  {} {}", "+".green().bold(), line),
            ActionType::Delete => println!("  {} {}", "-".red().bold(), line),
            ActionType::Update => {
                let replacement = if action.replacement {
                    " replacement".red().to_string()
                } else {
                    String::new()
                };
                println!("  {} {}{}", "~".yellow().bold(), line, replacement);
                if !action.changed_properties.is_empty() {
                    println!("      {}", action.changed_properties.join(", ").dimmed());
                }
            }
            ActionType::NoOp => {}
        }
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
    Ok(())
}
