use std::path::Path;
use std::process;

use netkat_core::classifier_from_str;

use super::read_input;
use crate::{report_netkat_error, OutputFormat};

pub(crate) fn cmd_classify(file: &Path, output: OutputFormat, quiet: bool) {
    let source = read_input(file, output, quiet);
    tracing::info!(file = %file.display(), "reading flow table");

    let classifier = match classifier_from_str(&source) {
        Ok(c) => c,
        Err(e) => {
            report_netkat_error(&e, output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&classifier)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for (i, rule) in classifier.iter().enumerate() {
                println!("{:>4}  {}", i, rule);
            }
            if !quiet {
                eprintln!("{} rules", classifier.len());
            }
        }
    }
}
