//! filematch command-line entry point.

use clap::Parser;
use filematch::cli::Cli;
use filematch::error::{ExitCode, StructuredError};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    let code = match filematch::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            report_fatal(&err, json_errors);
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

/// Print a fatal error on stderr, as JSON when asked to.
fn report_fatal(err: &anyhow::Error, json: bool) {
    let code = ExitCode::GeneralError;
    let rendered = if json {
        serde_json::to_string_pretty(&StructuredError::new(err, code)).ok()
    } else {
        None
    };
    match rendered {
        Some(text) => eprintln!("{text}"),
        None => eprintln!("[{}] Error: {err:#}", code.code_prefix()),
    }
}
