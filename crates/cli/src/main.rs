mod commands;
mod logging;

use std::path::{Path, PathBuf};
use std::process;

use apicompat_model::{load_baseline_str, Baseline};
use clap::{Parser, Subcommand, ValueEnum};

use commands::{cmd_compare, cmd_delta, cmd_problem_id, CompareArgs};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// API compatibility checker.
#[derive(Parser)]
#[command(
    name = "apicompat",
    version,
    about = "API compatibility checker for versioned component baselines"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a current baseline against a reference baseline
    Compare {
        /// Path to the reference baseline snapshot (JSON)
        reference: PathBuf,
        /// Path to the current baseline snapshot (JSON)
        current: PathBuf,
        /// Path to a .apiconfig file applied to every component
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report breakage even when the major version was incremented
        #[arg(long)]
        report_major_breakage: bool,
        /// Path to a problem filter store; created or updated as needed
        #[arg(long)]
        filters: Option<PathBuf>,
        /// Skip @since tag checks
        #[arg(long)]
        no_since_tags: bool,
        /// Skip checks for illegal use of other components' restricted types
        #[arg(long)]
        no_usage: bool,
    },

    /// Print the raw delta tree between two baselines
    Delta {
        /// Path to the reference baseline snapshot (JSON)
        reference: PathBuf,
        /// Path to the current baseline snapshot (JSON)
        current: PathBuf,
        /// Compare components even when their versions are equal
        #[arg(long)]
        force: bool,
    },

    /// Decode a packed problem id
    ProblemId {
        /// Decimal or 0x-prefixed hexadecimal id
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Compare {
            reference,
            current,
            config,
            report_major_breakage,
            filters,
            no_since_tags,
            no_usage,
        } => {
            let args = CompareArgs {
                reference,
                current,
                config,
                report_major_breakage,
                filters,
                check_since_tags: !no_since_tags,
                check_usage: !no_usage,
            };
            cmd_compare(&args, cli.output, cli.quiet);
        }
        Commands::Delta {
            reference,
            current,
            force,
        } => {
            cmd_delta(&reference, &current, force, cli.output, cli.quiet);
        }
        Commands::ProblemId { id } => {
            cmd_problem_id(&id, cli.output, cli.quiet);
        }
    }
}

/// Read and decode a baseline snapshot, exiting on failure.
pub(crate) fn read_baseline(path: &Path, output: OutputFormat, quiet: bool) -> Baseline {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match load_baseline_str(&text) {
        Ok(baseline) => baseline,
        Err(e) => {
            let msg = format!("error loading baseline '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Report an error message in the appropriate format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
