use crate::utils;
use colored::Colorize;
use std::path::PathBuf;
use vpce_config::OutputFormat;
use vpce_template::Assembly;

pub struct SynthArgs {
    pub file: Option<PathBuf>,
    pub stack_id: Option<String>,
    pub format: Option<OutputFormat>,
    pub out: Option<PathBuf>,
    pub stdout: bool,
}

pub async fn handle(args: SynthArgs) -> anyhow::Result<()> {
    let settings = utils::load_settings()?;
    let loaded = utils::load_stack(args.file.as_deref(), args.stack_id.as_deref(), &settings)?;
    utils::print_source(&loaded);

    let stack = &loaded.stack;
    utils::print_diagnostics(&vpce_core::lint(stack));

    let template = vpce_template::synthesize(stack)?;

    if args.stdout {
        let body = match args.format.unwrap_or(settings.format) {
            OutputFormat::Json => template.to_json()?,
            OutputFormat::Yaml => template.to_yaml()?,
        };
        println!("{}", body);
        return Ok(());
    }

    let out = args.out.unwrap_or(settings.output_dir);
    let path = Assembly::new(&out).write(&stack.id, &template).await?;

    println!(
        "{} {} ({} resources, {} outputs)",
        "✓ Synthesized".green().bold(),
        stack.id.cyan(),
        template.resources.len(),
        template.outputs.len()
    );
    println!("  {}", path.display());
    Ok(())
}
