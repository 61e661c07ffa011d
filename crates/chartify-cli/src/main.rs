//! Chartify CLI - turn rendered Kubernetes manifests into a Helm chart

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod chart;
mod commands;
mod error;
mod exit_codes;
mod input;
mod logging;

use commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "chartify")]
#[command(author = "Chartify Contributors")]
#[command(version)]
#[command(about = "Turn rendered Kubernetes manifests into a Helm chart", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a chart from rendered manifests
    Generate {
        /// Chart directory to write
        chart_dir: PathBuf,

        /// Manifest files or directories (reads stdin when omitted)
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Chart name (defaults to the chart directory name)
        #[arg(long)]
        name: Option<String>,

        /// Prefix the manifests were rendered with, if not the chart name
        #[arg(long)]
        name_override: Option<String>,

        /// Chart appVersion
        #[arg(long)]
        app_version: Option<String>,

        /// Annotation added to every resource (KEY=VALUE)
        #[arg(long = "annotation")]
        annotations: Vec<String>,

        /// Replace existing templates
        #[arg(long)]
        force: bool,

        /// Copy objects of unsupported kinds into the chart verbatim
        #[arg(long)]
        generic: bool,

        /// Stop at the first object that fails to convert
        #[arg(long)]
        fail_fast: bool,

        /// Print the chart instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which processor handles each object
    Inspect {
        /// Manifest files or directories (reads stdin when omitted)
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Include the catch-all processor
        #[arg(long)]
        generic: bool,
    },
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let result = match cli.command {
        Commands::Generate {
            chart_dir,
            files,
            name,
            name_override,
            app_version,
            annotations,
            force,
            generic,
            fail_fast,
            dry_run,
        } => commands::generate::run(&GenerateOptions {
            chart_dir,
            files,
            name,
            name_override,
            app_version,
            annotations,
            force,
            generic,
            fail_fast,
            dry_run,
        }),

        Commands::Inspect { files, generic } => commands::inspect::run(&files, generic),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code as u8)
        }
    }
}
