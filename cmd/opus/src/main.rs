//! opusbridge - encode, decode and inspect fixed-size Opus packet streams.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{DecodeCommand, EncodeCommand, InspectCommand};

/// Command line front end for the fixed-size Opus sessions.
///
/// Packet streams are plain concatenations of equally sized packets, so no
/// container or length prefix is needed to split them again.
#[derive(Parser)]
#[command(name = "opusbridge")]
#[command(about = "Fixed-size Opus packet tool")]
#[command(version)]
pub struct Cli {
    /// Output summaries as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (debug logs)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode s16le PCM into fixed-size packets
    Encode(EncodeCommand),
    /// Decode a fixed-size packet stream into s16le PCM
    Decode(DecodeCommand),
    /// Print the header of every packet in a stream
    Inspect(InspectCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Encode(cmd) => cmd.run(&cli),
        Commands::Decode(cmd) => cmd.run(&cli),
        Commands::Inspect(cmd) => cmd.run(&cli),
    }
}
