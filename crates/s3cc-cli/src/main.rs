mod cli;

use crate::cli::CliCommand;

/// Exit status for errors that stop the run itself (bad arguments, config, I/O).
const EXIT_FATAL: i32 = 2;

fn main() {
    // Parse CLI, load config, initialize logging, dispatch.
    match CliCommand::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("s3cc error: {:#}", err);
            std::process::exit(EXIT_FATAL);
        }
    }
}
