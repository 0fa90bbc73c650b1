use anyhow::Result;
use clap::Parser;
use doorscan::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
