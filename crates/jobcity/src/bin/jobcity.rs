use anyhow::Result;
use clap::Parser;
use jobcity::cli::{self, Cli};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(&cli)
}
