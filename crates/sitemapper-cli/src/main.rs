//! sitemapper binary entry point

use std::process::ExitCode;

use sitemapper_cli::error::exit_code_from_error;

fn main() -> ExitCode {
    match sitemapper_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
