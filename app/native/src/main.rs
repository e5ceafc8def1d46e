#![allow(clippy::multiple_crate_versions)]

//! wallcycle command-line entry point.

fn main() {
    if let Err(err) = wallcycle_lib::cli::run() {
        eprintln!("wallcycle: {err}");
        std::process::exit(1);
    }
}
