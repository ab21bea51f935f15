//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a file to a simulated peer over the radio link
    Send {
        /// File to send
        file: PathBuf,

        /// Directory the peer writes received files to
        #[arg(short, long, default_value = "received")]
        out: PathBuf,

        /// Radio packet size in bytes
        #[arg(long)]
        mtu: Option<u16>,

        /// Fail every Nth radio write
        #[arg(long)]
        fail_every: Option<u32>,

        /// Delay before the peer connects
        #[arg(long, default_value_t = 100)]
        connect_delay_ms: u64,

        /// Drop the peer after this many delivered packets
        #[arg(long)]
        disconnect_after: Option<u64>,

        /// Overall transfer timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}
