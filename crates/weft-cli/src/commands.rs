use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use tracing::debug;

use weft_client_registry::ClientRegistry;
use weft_shim::{Chaincode, LedgerSnapshot, MemoryLedger, Response};
use weft_topic_registry::TopicRegistry;

use crate::cli::*;

enum EntryPoint {
    Init,
    Invoke,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        state,
        time,
    } = cli;
    match command {
        Command::Init(args) => call(state, time.as_deref(), args, EntryPoint::Init),
        Command::Invoke(args) => call(state, time.as_deref(), args, EntryPoint::Invoke),
    }
}

/// Load the ledger, run one entry point, persist the ledger and report the
/// response. Effects of a failed invocation are not persisted.
fn call(
    state_override: Option<PathBuf>,
    pinned_time: Option<&str>,
    request: CallArgs,
    entry: EntryPoint,
) -> anyhow::Result<()> {
    let state_file = state_override.unwrap_or_else(|| default_state_file(request.contract));
    let ledger = load_ledger(&state_file)?;
    if let Some(text) = pinned_time {
        let time: DateTime<Utc> = text
            .parse()
            .with_context(|| format!("invalid --time value {text:?}"))?;
        ledger.set_tx_timestamp(time);
    }

    let contract: Box<dyn Chaincode> = match request.contract {
        ContractKind::Topic => Box::new(TopicRegistry::new()),
        ContractKind::Client => Box::new(ClientRegistry::new()),
    };

    let response = match entry {
        EntryPoint::Init => contract.init(&ledger, &request.function, &request.args),
        EntryPoint::Invoke => contract.invoke(&ledger, &request.function, &request.args),
    };

    if response.is_ok() {
        save_ledger(&state_file, &ledger)?;
    }
    report(response)
}

/// Per-contract snapshot file used when `--state` is absent, so the two
/// contracts never read each other's records.
fn default_state_file(contract: ContractKind) -> PathBuf {
    match contract {
        ContractKind::Topic => PathBuf::from("weft-topic-ledger.json"),
        ContractKind::Client => PathBuf::from("weft-client-ledger.json"),
    }
}

fn load_ledger(path: &Path) -> anyhow::Result<MemoryLedger> {
    if !path.exists() {
        return Ok(MemoryLedger::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read ledger state {}", path.display()))?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("corrupt ledger state {}", path.display()))?;
    let ledger = MemoryLedger::from_snapshot(snapshot);
    debug!(keys = ledger.len(), "ledger state loaded");
    Ok(ledger)
}

fn save_ledger(path: &Path, ledger: &MemoryLedger) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(&ledger.to_snapshot())
        .context("failed to encode ledger state")?;
    fs::write(path, text)
        .with_context(|| format!("failed to write ledger state {}", path.display()))?;
    debug!(keys = ledger.len(), "ledger state saved");
    Ok(())
}

fn report(response: Response) -> anyhow::Result<()> {
    match response {
        Response::Success { payload } => {
            if payload.is_empty() {
                println!("{}", "✓ 200".green().bold());
            } else {
                println!(
                    "{} {}",
                    "✓ 200".green().bold(),
                    String::from_utf8_lossy(&payload)
                );
            }
            Ok(())
        }
        Response::BadRequest { message } => {
            println!("{} {}", "✗ 400".red().bold(), message.red());
            anyhow::bail!("invocation rejected: {message}")
        }
        Response::InternalError { detail } => {
            println!("{} {}", "✗ 500".red().bold(), detail.red());
            anyhow::bail!("invocation failed: {detail}")
        }
    }
}
