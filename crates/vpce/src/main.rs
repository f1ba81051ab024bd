mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use vpce_config::OutputFormat;

#[derive(Parser)]
#[command(name = "vpce")]
#[command(about = "Synthesize the VPC endpoint service producer stack into CloudFormation", long_about = None)]
struct Cli {
    /// Stack file to load instead of searching the current directory
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the CloudFormation template
    Synth {
        /// Override the stack id
        #[arg(long, env = "VPCE_STACK_ID")]
        stack_id: Option<String>,
        /// Output format for --stdout (json, yaml)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Output directory
        #[arg(short, long, env = "VPCE_OUT_DIR")]
        out: Option<PathBuf>,
        /// Print the template instead of writing it
        #[arg(long)]
        stdout: bool,
    },
    /// Show what changed since the last synth
    Diff {
        /// Override the stack id
        #[arg(long, env = "VPCE_STACK_ID")]
        stack_id: Option<String>,
        /// Output directory holding the previous template
        #[arg(short, long, env = "VPCE_OUT_DIR")]
        out: Option<PathBuf>,
    },
    /// Check the stack definition
    Validate,
    /// List the stack outputs and their exports
    Outputs,
    /// Write a stack.kdl describing the default producer stack
    Init {
        /// Overwrite an existing stack.kdl
        #[arg(long)]
        force: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Version => {
            println!("vpce {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Init { force } => commands::init::handle(force),
        Commands::Synth {
            stack_id,
            format,
            out,
            stdout,
        } => {
            commands::synth::handle(commands::synth::SynthArgs {
                file: cli.file,
                stack_id,
                format,
                out,
                stdout,
            })
            .await
        }
        Commands::Diff { stack_id, out } => {
            commands::diff::handle(cli.file.as_deref(), stack_id, out).await
        }
        Commands::Validate => commands::validate::handle(cli.file.as_deref()),
        Commands::Outputs => commands::outputs::handle(cli.file.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
