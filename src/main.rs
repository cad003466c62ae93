use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod sync;

use crate::args::{Args, Command};

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let res = match args.command {
        Command::Reconcile(ref a) => sync::run_reconcile(a),
        Command::Survey(ref a) => sync::run_survey(a),
    };

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
