use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;

pub mod listen;
pub mod open;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for a peer's OPEN on a unix socket and print received payload.
    Listen(ListenArgs),
    /// Open a data channel to a listening peer.
    Open(OpenArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args),
        Command::Open(args) => open::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Echo received payload back to the peer.
    #[arg(long)]
    pub echo: bool,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Channel name, transmitted in OPEN.
    #[arg(long, default_value = "")]
    pub label: String,
    /// Sub-protocol name, transmitted in OPEN.
    #[arg(long, default_value = "")]
    pub protocol: String,
    /// Channel priority (0, 128, 256, 512 or 1024).
    #[arg(long, default_value = "0")]
    pub priority: u16,
    /// Do not require ordered delivery.
    #[arg(long)]
    pub unordered: bool,
    /// Retransmission limit for partial reliability.
    #[arg(long, conflicts_with = "lifetime")]
    pub retries: Option<u32>,
    /// Lifetime limit in milliseconds for partial reliability.
    #[arg(long, conflicts_with = "retries")]
    pub lifetime: Option<u32>,
    /// Payload to send once the channel opens.
    #[arg(long)]
    pub data: Option<String>,
    /// Keep the channel open and print replies until the peer closes.
    #[arg(long)]
    pub wait: bool,
}

/// Write payload bytes to stdout unmodified.
pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
