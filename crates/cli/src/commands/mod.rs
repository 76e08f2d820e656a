mod classify;
mod compile;
mod headers;

pub(crate) use classify::cmd_classify;
pub(crate) use compile::cmd_compile;
pub(crate) use headers::cmd_headers;

use std::path::Path;
use std::process;

use crate::{report_error, OutputFormat};

/// Read a file or exit with a reported error.
pub(crate) fn read_input(path: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
