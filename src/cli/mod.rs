use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod detect;
mod generate;

/// gamma-peaks - local-maxima finder for gamma spectra
#[derive(Parser)]
#[command(name = "gamma-peaks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthetic noisy spectra with randomly placed spikes
    Generate {
        /// Output file (.parquet, .json or .csv)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Number of bins per spectrum
        #[arg(short, long, default_value_t = 1000)]
        length: usize,

        /// Spikes injected into each spectrum
        #[arg(short, long, default_value_t = 7)]
        spikes: usize,

        /// Seed for reproducible output; spectrum i uses seed + i
        #[arg(long)]
        seed: Option<u64>,

        /// Number of spectra to write
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// First value of an evenly spaced x axis (needs --x-max)
        #[arg(long, requires = "x_max")]
        x_min: Option<f64>,

        /// Last value of an evenly spaced x axis (needs --x-min)
        #[arg(long, requires = "x_min")]
        x_max: Option<f64>,
    },

    /// Find peaks in every spectrum of a file and print them
    Detect {
        /// Input file (.parquet, .json or .csv)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print JSON records instead of CSV
        #[arg(long)]
        json: bool,
    },
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            output,
            length,
            spikes,
            seed,
            count,
            x_min,
            x_max,
        } => {
            let axis = x_min.zip(x_max);
            generate::run(&output, length, spikes, seed, count, axis)
        }
        Commands::Detect { input, json } => detect::run(&input, json),
    }
}
