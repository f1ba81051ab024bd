use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(file: Option<&Path>) -> anyhow::Result<()> {
    let settings = utils::load_settings()?;
    let loaded = utils::load_stack(file, None, &settings)?;
    utils::print_source(&loaded);

    let stack = &loaded.stack;
    if stack.outputs.is_empty() {
        println!("{}", "No outputs declared".yellow());
        return Ok(());
    }

    for output in &stack.outputs {
        let value = match &output.scheme {
            Some(scheme) => format!("{}://<{} DNS name>", scheme, output.load_balancer),
            None => format!("<{} DNS name>", output.load_balancer),
        };
        let export = output
            .export_name
            .as_deref()
            .map(|name| format!(" (export: {})", name))
            .unwrap_or_default();
        println!("{}: {}{}", output.name.cyan(), value, export.dimmed());
    }
    Ok(())
}
