//! CLI argument parsing for the controle-tecnicos binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "controle-tecnicos", about = "Nearest technician dispatch service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,
    /// Resolve an address to coordinates and exit
    Geocode {
        /// Free-text address
        address: String,
    },
    /// Look up the address at a coordinate
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Match one service address against the roster and print the result
    Match {
        /// Free-text service address
        address: String,
    },
}
