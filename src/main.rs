use std::process::ExitCode;

use clap::Parser;

use lumaedit::cli::{self, CliArgs};
use lumaedit::logger;

fn main() -> ExitCode {
    logger::init();
    lumaedit::log_info!("Arguments: {:?}", std::env::args().skip(1).collect::<Vec<_>>());
    cli::run(CliArgs::parse())
}
