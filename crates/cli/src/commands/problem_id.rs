use std::process;

use apicompat_analyze::ProblemId;

use crate::{report_error, OutputFormat};

fn parse_id(input: &str) -> Option<u32> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => input.parse().ok(),
    }
}

pub(crate) fn cmd_problem_id(input: &str, output: OutputFormat, quiet: bool) {
    let Some(raw) = parse_id(input) else {
        report_error(&format!("invalid problem id '{}'", input), output, quiet);
        process::exit(1);
    };
    let id = ProblemId(raw);
    let Some(description) = id.describe() else {
        report_error(&format!("unknown problem id {}", raw), output, quiet);
        process::exit(1);
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "id": raw,
                "category": id.category_code(),
                "element": id.element_code(),
                "kind": id.kind_code(),
                "flag": id.flag_code(),
                "description": description,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            );
        }
        OutputFormat::Text => println!("{}: {}", raw, description),
    }
}
