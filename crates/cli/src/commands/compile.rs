use std::path::Path;
use std::process;

use netkat_core::{compile_to_netkat, compile_to_netkat_pretty, parse_policy};

use super::read_input;
use crate::{report_netkat_error, OutputFormat};

pub(crate) fn cmd_compile(file: &Path, pretty: bool, output: OutputFormat, quiet: bool) {
    let source = read_input(file, output, quiet);
    tracing::info!(file = %file.display(), "compiling policy");

    let compiled = parse_policy(&source).and_then(|policy| {
        if pretty {
            compile_to_netkat_pretty(&policy)
        } else {
            compile_to_netkat(&policy)
        }
    });

    match compiled {
        Ok(json) => println!("{}", json),
        Err(e) => {
            report_netkat_error(&e, output, quiet);
            process::exit(1);
        }
    }
}
