use std::path::Path;

use apicompat_compare::{compare_baselines, CompareOptions};

use crate::{read_baseline, OutputFormat};

pub(crate) fn cmd_delta(
    reference_path: &Path,
    current_path: &Path,
    force: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let reference = read_baseline(reference_path, output, quiet);
    let current = read_baseline(current_path, output, quiet);

    let delta = compare_baselines(&reference, &current, CompareOptions { force });
    if quiet {
        return;
    }
    match (delta, output) {
        (None, OutputFormat::Json) => println!("null"),
        (None, OutputFormat::Text) => println!("no differences"),
        (Some(delta), OutputFormat::Json) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&delta.to_json()).unwrap_or_default()
            );
        }
        (Some(delta), OutputFormat::Text) => {
            println!("{} change(s)", delta.leaf_count());
            println!("{}", delta.to_text());
        }
    }
}
