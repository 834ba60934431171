//! txwatch CLI — follow a chain and index its transactions by address.
//!
//! Usage:
//! ```bash
//! # Follow mainnet from the current head, watching one address
//! txwatch run --watch 0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5
//!
//! # Start at a fixed height against a local node, persisting to SQLite
//! txwatch run --url http://localhost:8545 --start 19912329 --db ./txwatch.db
//!
//! # Print the current chain height
//! txwatch height --url https://ethereum-rpc.publicnode.com
//! ```

mod config;
mod logging;

use std::collections::BTreeMap;
use std::env;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use txwatch_core::{shutdown_channel, AddressIndex, ChainReader, Parser, TxRecord};
use txwatch_evm::{EthRpcClient, DEFAULT_RPC_URL};
use txwatch_storage::{InMemoryAddressIndex, SqliteAddressIndex};

use crate::config::AppConfig;
use crate::logging::init_tracing;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "height" => cmd_height(&args[2..]).await,
        "info" => {
            cmd_info();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("txwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("txwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Follow a blockchain and index its transactions by address\n");
    println!("USAGE:");
    println!("    txwatch <COMMAND>\n");
    println!("COMMANDS:");
    println!("    run      Scan blocks and index transactions until Ctrl-C");
    println!("    height   Print the current chain height");
    println!("    info     Show txwatch defaults");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("RUN FLAGS:");
    println!("    --url <URL>       RPC endpoint URL  [default: {DEFAULT_RPC_URL}]");
    println!("    --start <HEIGHT>  First height to scan; 0 means the current head  [default: 0]");
    println!("                      From the head, a block that is not out yet is retried");
    println!("                      for about two minutes instead of halting the scanner");
    println!("    --config <FILE>   JSON config file");
    println!("    --db <FILE>       Persist the index to a SQLite file");
    println!("    --watch <ADDR>    Subscribe an address (repeatable)");
    println!("    --json            Print results and logs as JSON");
}

fn cmd_info() {
    println!("txwatch v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default RPC endpoint: {DEFAULT_RPC_URL}");
    println!("  Default poll interval: 30ms");
    println!("  Default fan-out: accumulate (every record kept)");
    println!("  Default fetch failure policy: halt (fixed --start)");
    println!("  Following the head (--start 0): retry 60x, 0.5s doubling to 2s");
    println!("  Storage backends: inmemory, sqlite (--db)");
}

async fn cmd_height(args: &[String]) -> anyhow::Result<()> {
    let url = parse_flag(args, "--url").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
    let client = EthRpcClient::default_for(&url)?;
    let height = client.current_height().await?;
    println!("{height}");
    Ok(())
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = parse_flag(args, "--url") {
        config.rpc_url = url;
    }
    if let Some(db) = parse_flag(args, "--db") {
        config.db = Some(db);
    }
    if let Some(start) = parse_flag(args, "--start") {
        config.scanner.start_height = start
            .parse()
            .with_context(|| format!("--start: not a block height: {start}"))?;
    }
    config.watch.extend(parse_flags(args, "--watch"));
    let json = args.iter().any(|a| a == "--json");
    if json {
        config.log.json = true;
    }

    init_tracing(&config.log);

    let reader: Arc<dyn ChainReader> = Arc::new(EthRpcClient::default_for(&config.rpc_url)?);
    let index: Arc<dyn AddressIndex> = match &config.db {
        Some(path) => Arc::new(SqliteAddressIndex::open(path).await?),
        None => Arc::new(InMemoryAddressIndex::new()),
    };

    let head = reader
        .current_height()
        .await
        .with_context(|| format!("failed to reach {}", reader.endpoint()))?;
    config.resolve_start(head);

    info!(
        backend = index.name(),
        endpoint = reader.endpoint(),
        head,
        start = config.scanner.start_height,
        fetch_failure = ?config.scanner.fetch_failure,
        "Starting txwatch"
    );

    let (trigger, shutdown) = shutdown_channel();
    let parser = Parser::new(config.scanner.clone(), Arc::clone(&index), reader, shutdown)?;

    for address in &config.watch {
        if !parser.subscribe(address).await {
            warn!(address = %address, "Could not subscribe");
        }
    }

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            info!("Interrupted, shutting down");
        }
        status = parser.wait_for_height(u64::MAX) => {
            warn!(state = %status.state, last_scanned = ?status.last_scanned, "Scanner stopped");
        }
    }

    trigger.cancel();
    let last_scanned = parser.last_scanned();
    let mut report = BTreeMap::new();
    for address in &config.watch {
        report.insert(address.clone(), parser.transactions_for(address).await);
    }
    let outcome = parser.join().await;

    print_report(&report, last_scanned, json)?;
    outcome.context("scanner halted")
}

fn print_report(
    report: &BTreeMap<String, Vec<TxRecord>>,
    last_scanned: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match last_scanned {
        Some(height) => println!("Last scanned block: {height}"),
        None => println!("No blocks scanned"),
    }
    for (address, records) in report {
        let activity: Vec<_> = records.iter().filter(|r| !r.is_marker()).collect();
        println!("\n{address}: {} transaction(s)", activity.len());
        for r in activity {
            println!("  {:<8} {} block {} {} -> {}", r.kind.to_string(), r.hash, r.block_height, r.from, r.to);
        }
    }
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

/// Every value of a repeatable flag.
fn parse_flags(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn single_flag() {
        let a = args("--url http://localhost:8545 --start 100");
        assert_eq!(parse_flag(&a, "--url").as_deref(), Some("http://localhost:8545"));
        assert_eq!(parse_flag(&a, "--start").as_deref(), Some("100"));
        assert_eq!(parse_flag(&a, "--db"), None);
    }

    #[test]
    fn flag_without_value() {
        assert_eq!(parse_flag(&args("--url"), "--url"), None);
    }

    #[test]
    fn repeated_flag() {
        let a = args("--watch 0xa --json --watch 0xb");
        assert_eq!(parse_flags(&a, "--watch"), vec!["0xa", "0xb"]);
        assert!(parse_flags(&a, "--db").is_empty());
    }
}
