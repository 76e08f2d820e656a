mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::{cmd_classify, cmd_compile, cmd_headers};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// NetKAT policy compiler and flow-table reader.
#[derive(Parser)]
#[command(name = "netkat", version, about = "NetKAT policy compiler and flow-table reader")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a policy document to NetKAT JSON
    Compile {
        /// Path to the policy JSON document
        file: PathBuf,
        /// Indent the compiled JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Rebuild the classifier encoded by a compiled flow table
    Classify {
        /// Path to the flow-table JSON file
        file: PathBuf,
    },

    /// Print the header mapping tables
    Headers,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "netkat_cli=debug,netkat_core=debug"
    } else {
        "netkat_cli=warn,netkat_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { file, pretty } => {
            cmd_compile(&file, pretty, cli.output, cli.quiet);
        }
        Commands::Classify { file } => {
            cmd_classify(&file, cli.output, cli.quiet);
        }
        Commands::Headers => {
            cmd_headers(cli.output);
        }
    }
}

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

pub(crate) fn report_netkat_error(
    err: &netkat_core::NetKatError,
    output: OutputFormat,
    quiet: bool,
) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&err.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", err));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", err);
            }
        }
    }
}
