//! `robot-diff`: structural diff of two robot descriptions.
//!
//! ```text
//! robot-diff old.urdf new.xml --format category --exclude visual
//! ```
//!
//! The normalizer for each file is chosen by its extension: `.urdf`, `.sdf`,
//! `.xml` (MJCF) or any extension containing `usd`. The two files do not have
//! to share a format.

#![deny(clippy::unwrap_used, clippy::expect_used)]

mod args;
mod logging;
mod run;

use std::process::ExitCode;

use clap::Parser;

use crate::args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run::run(&args) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
