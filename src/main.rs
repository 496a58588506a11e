mod cli;

use clap::Parser;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    cli::run(Cli::parse())
}
