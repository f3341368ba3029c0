use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use featstream::{ByteOrder, ByteOrderSetting};

mod check;
mod config;
mod convert;
mod dump;
mod info;
mod merge;

/// featstream - Acoustic Feature File Toolkit
#[derive(Parser)]
#[command(name = "featstream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load reader settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Byte order of input files (overrides the config file)
    #[arg(short = 'b', long, value_enum, global = true)]
    byte_order: Option<ByteOrderArg>,

    #[command(subcommand)]
    command: Commands,
}

/// Byte order accepted on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ByteOrderArg {
    /// Detect from the header
    Auto,
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl From<ByteOrderArg> for ByteOrderSetting {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Auto => ByteOrderSetting::Auto,
            ByteOrderArg::Big => ByteOrderSetting::Big,
            ByteOrderArg::Little => ByteOrderSetting::Little,
        }
    }
}

/// Byte order written by `convert` and `merge`
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputOrderArg {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
    /// Byte order of this machine
    Native,
}

impl From<OutputOrderArg> for ByteOrder {
    fn from(arg: OutputOrderArg) -> Self {
        match arg {
            OutputOrderArg::Big => ByteOrder::Big,
            OutputOrderArg::Little => ByteOrder::Little,
            OutputOrderArg::Native => ByteOrder::native(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, flags and sources of a feature file
    Info {
        /// Input feature file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Print frames as text
    Dump {
        /// Input feature file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Restrict to one source, by name
        #[arg(short, long)]
        source: Option<String>,

        /// First frame, relative to the source when one is given
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Number of frames to print (all remaining when omitted)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Re-encode a feature file in another byte order
    Convert {
        /// Input feature file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output feature file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Byte order of the output
        #[arg(long, value_enum, default_value = "native")]
        to: OutputOrderArg,
    },

    /// Concatenate feature files into one multi-source file
    Merge {
        /// Output feature file path
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Input feature files, in order
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Byte order of the output
        #[arg(long, value_enum, default_value = "native")]
        to: OutputOrderArg,
    },

    /// Validate feature file integrity
    Check {
        /// Input feature file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let reader = config::load_reader_config(cli.config.as_deref(), cli.byte_order.map(Into::into))?;

    match cli.command {
        Commands::Info { file, json } => info::run(file, &reader, json),
        Commands::Dump {
            file,
            source,
            start,
            count,
        } => dump::run(file, &reader, source, start, count),
        Commands::Convert { input, output, to } => convert::run(input, output, &reader, to.into()),
        Commands::Merge { output, inputs, to } => merge::run(inputs, output, &reader, to.into()),
        Commands::Check { file, json } => check::run(file, &reader, json),
    }
}
