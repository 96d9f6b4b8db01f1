//! n2k-core CLI entry point.

use clap::Parser;
use n2k_core::cli::{run, Cli};
use n2k_core::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);
    let code = run(&cli);
    std::process::exit(code.as_i32());
}
