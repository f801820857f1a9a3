mod args;
mod merge;

use clap::Parser;
use log::debug;
use snafu::ErrorCompat;

use crate::args::Args;
use crate::merge::MergeError;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    match merge::run_merge_job(&args) {
        Ok(summary) => debug!("summary: {:?}", summary),
        Err(MergeError::MissingInput { path }) => {
            println!("Error: File {} not found", path);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            for cause in ErrorCompat::iter_chain(&e).skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            } else {
                eprintln!("No trace found");
            }
            std::process::exit(1);
        }
    }
}
