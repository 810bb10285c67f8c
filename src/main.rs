use clap::Parser;
use std::process;
use xdi_processor::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
