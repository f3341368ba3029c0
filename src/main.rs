//! # featstream
//!
//! A command-line tool for inspecting and rewriting acoustic feature files.
//!
//! ## Usage
//!
//! ```bash
//! # Header, flags and sources
//! featstream info spk01.prm --json
//!
//! # Frames of one source
//! featstream dump session.prm --source spk02 -n 10
//!
//! # Re-encode big-endian
//! featstream convert spk01.prm spk01.be.prm --to big
//!
//! # Concatenate recordings into one multi-source file
//! featstream merge -o session.prm spk01.prm spk02.prm
//!
//! # Validate
//! featstream check session.prm
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
