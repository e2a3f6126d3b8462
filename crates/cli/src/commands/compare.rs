use std::path::PathBuf;
use std::process;

use apicompat_analyze::{analyze, AnalyzerOptions, ApiConfigSettings, FilterStore};
use tracing::info;

use crate::{read_baseline, report_error, OutputFormat};

pub(crate) struct CompareArgs {
    pub reference: PathBuf,
    pub current: PathBuf,
    pub config: Option<PathBuf>,
    pub report_major_breakage: bool,
    pub filters: Option<PathBuf>,
    pub check_since_tags: bool,
    pub check_usage: bool,
}

pub(crate) fn cmd_compare(args: &CompareArgs, output: OutputFormat, quiet: bool) {
    let reference = read_baseline(&args.reference, output, quiet);
    let current = read_baseline(&args.current, output, quiet);

    let settings = match &args.config {
        None => ApiConfigSettings::default(),
        Some(path) => match ApiConfigSettings::load(path) {
            Ok(s) => s,
            Err(e) => {
                report_error(&format!("error loading settings: {}", e), output, quiet);
                process::exit(1);
            }
        },
    };

    let mut filters = match &args.filters {
        None => FilterStore::new(),
        Some(path) => match FilterStore::load(path) {
            Ok(store) => store,
            Err(e) => {
                report_error(&format!("error loading filters: {}", e), output, quiet);
                process::exit(1);
            }
        },
    };
    let filters_before = filters.len();

    let options = AnalyzerOptions {
        report_breakage_when_major_changed: args.report_major_breakage,
        check_since_tags: args.check_since_tags,
        check_usage: args.check_usage,
        ..AnalyzerOptions::default()
    };
    let report = analyze(&reference, &current, |_| settings.clone(), &options, &mut filters);

    if let Some(path) = &args.filters {
        if filters.len() != filters_before {
            if let Err(e) = filters.save(path) {
                report_error(&format!("error saving filters: {}", e), output, quiet);
                process::exit(1);
            }
            info!(added = filters.len() - filters_before, "filter store updated");
        }
    }

    if !quiet {
        match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
                );
            }
            OutputFormat::Text => println!("{}", report.to_text()),
        }
    }

    if report.has_errors() {
        process::exit(1);
    }
}
