use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "weft",
    about = "Weft — demo driver for the example contracts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger snapshot file carried across runs; defaults to a
    /// per-contract file, weft-<contract>-ledger.json
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Pin the transaction timestamp (RFC 3339) for reproducible output
    #[arg(long, global = true)]
    pub time: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Drive a contract's initialization entry point
    Init(CallArgs),
    /// Drive a contract's invocation entry point
    Invoke(CallArgs),
}

#[derive(Args)]
pub struct CallArgs {
    /// Contract to run
    pub contract: ContractKind,
    /// Function name routed by the entry point
    pub function: String,
    /// Positional string arguments for the function
    pub args: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ContractKind {
    /// Topic registry: records shaped {"type", "topic"}
    Topic,
    /// Client registry: timestamped registrations with rich queries
    Client,
}
