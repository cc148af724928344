mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{access, green, icvu, query};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Green(args) => green::run(&cli, args),
        Commands::Access(args) => access::run(&cli, args),
        Commands::Query(args) => query::run(&cli, args),
        Commands::Icvu(args) => icvu::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
