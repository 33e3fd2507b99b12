//! tinypack command line
//!
//! Packs the game in the current directory. Without flags a readable debug build is
//! written to the output directory; `--small` produces the minified build and the
//! size-checked archive.
//!
//! # Usage
//! ```bash
//! tinypack          # debug build
//! tinypack --small  # minified build and archive
//! ```

use clap::Parser;
use std::process::ExitCode;
use tinypack_build::{BuildMode, Manifest};

/// Command-line arguments for the packer
#[derive(Parser)]
#[command(version, about = "Packs a small web game into a size-limited archive")]
struct Args {
    /// Produce the minified build and the archive
    #[arg(long)]
    small: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }

    let mode = if args.small { BuildMode::Minified } else { BuildMode::Debug };
    let result = Manifest::discover(".").and_then(|manifest| tinypack_build::run(&manifest, mode));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
