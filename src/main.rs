use std::process::exit;

use clap::Parser;
use log::LevelFilter;

mod cli;
mod common;
mod module;
mod path;
mod process;
mod rewrite;
mod run;
mod signal;

use cli::Cli;
use common::{Error, IntoResult};

/// Variable holding the log filter, `env_logger` syntax.
const LOG_VARIABLE: &str = "POSIXRUN_LOG";

fn init_logging(quiet: bool) {
    let mut builder = if quiet {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Off);
        builder
    } else {
        env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_VARIABLE, "warn"))
    };
    builder.format_timestamp(None).format_target(false).init();
}

fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    init_logging(quiet);

    let result = run::execute(cli).into_result();
    match result {
        Ok(()) => {
            exit(0);
        }
        Err(Error::Code(code)) => {
            exit(code);
        }
        Err(err) => {
            if !quiet {
                eprintln!("posixrun: {}", err);
            }
            exit(err.exit_code());
        }
    }
}
