use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "spanpack-cmd")]
#[command(about = "Command-line utility for spanpack occurrence payloads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex encoded payload and print the record as JSON
    Decode {
        /// Absolute position of the posting the payload belongs to
        #[arg(short, long, default_value_t = 0)]
        start: u64,

        /// Payload bytes in hex (reads stdin when omitted or "-")
        payload: Option<String>,
    },

    /// Encode a JSON record and print the payload in hex
    Encode {
        /// Absolute position of the posting the payload belongs to
        #[arg(short, long, default_value_t = 0)]
        start: u64,

        /// Record as JSON (reads stdin when omitted or "-")
        record: Option<String>,
    },

    /// Show the header flags and the bit layout of a hex encoded payload
    Inspect {
        /// Increase verbosity (-v prints the raw bits of every field)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Absolute position of the posting the payload belongs to
        #[arg(short, long, default_value_t = 0)]
        start: u64,

        /// Payload bytes in hex (reads stdin when omitted or "-")
        payload: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { start, payload } => commands::decode::run(start, payload),
        Commands::Encode { start, record } => commands::encode::run(start, record),
        Commands::Inspect {
            verbose,
            start,
            payload,
        } => commands::inspect::run(verbose, start, payload),
    }
}
