//! poolgen binary entry point

use clap::Parser;
use poolgen::{format_error, Cli, PoolgenError};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run() {
        match err.downcast_ref::<PoolgenError>() {
            Some(poolgen_err) => eprintln!("{}", format_error(poolgen_err)),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
