//! `rpcpipe` Diagnostics Binary
//!
//! Loads configuration, registers the built-in interfaces and lets an
//! operator inspect the registry or push a single call through the
//! dispatcher.
//!
//! ## Usage
//!
//! ```bash
//! # List registered interfaces
//! rpcpipe list
//! rpcpipe list --json
//!
//! # Dispatch one call (stub data read from a file, empty if omitted)
//! rpcpipe call --uuid da5a86c5-12c2-4943-ab30-7f74a813d853 --version 1.0 --opnum 0
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rpcpipe::{interfaces, logging, Config, Dispatcher, InboundCall, InterfaceId, InterfaceVersion, Registry, Reply};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rpcpipe", about = "RPC interface registry and dispatch diagnostics")]
struct Cli {
    /// Configuration file (defaults to rpcpipe.toml + RPCPIPE_* env vars)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered interfaces
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Dispatch one call and print the reply
    Call {
        #[arg(long)]
        uuid: Uuid,
        /// Interface version as `major.minor`
        #[arg(long, default_value = "1.0")]
        version: InterfaceVersion,
        #[arg(long)]
        opnum: u16,
        /// File holding the request stub data
        #[arg(long)]
        payload_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            Config::from_file(&path).with_context(|| format!("loading config from {path}"))?
        }
        None => Config::load().context("loading configuration")?,
    };
    logging::init_tracing(&config.logging);

    let registry = Arc::new(Registry::from_config(&config.registry));
    interfaces::init_all(&registry).context("registering built-in interfaces")?;

    let result = match cli.command {
        Commands::List { json } => list(&registry, json),
        Commands::Call {
            uuid,
            version,
            opnum,
            payload_file,
        } => {
            let dispatcher = Dispatcher::with_config(Arc::clone(&registry), config.dispatch.clone());
            call(&dispatcher, InterfaceId::new(uuid, version), opnum, payload_file)
        }
    };

    interfaces::shutdown_all(&registry);
    result
}

fn list(registry: &Registry, json: bool) -> Result<()> {
    let mut descriptors = registry.enumerate();
    descriptors.sort_by(|a, b| a.name().cmp(b.name()).then(a.version().cmp(&b.version())));

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    println!("{:<16} {:<38} {:<8} {:<16} OPNUMS", "NAME", "UUID", "VERSION", "PIPE");
    for desc in &descriptors {
        let opnums = registry
            .lookup(&desc.id())
            .map(|entry| entry.table().len())
            .unwrap_or_default();
        println!(
            "{:<16} {:<38} {:<8} {:<16} {}",
            desc.name(),
            desc.uuid(),
            desc.version(),
            desc.client_pipe(),
            opnums
        );
    }
    Ok(())
}

fn call(dispatcher: &Dispatcher, interface: InterfaceId, opnum: u16, payload_file: Option<PathBuf>) -> Result<()> {
    let stub_data = match payload_file {
        Some(path) => std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?,
        None => Vec::new(),
    };

    let reply = dispatcher.handle(&InboundCall::new(interface, opnum, stub_data));
    match &reply {
        Reply::Response { stub_data } => {
            println!("response: {} bytes", stub_data.len());
            println!("{}", hex(stub_data));
        }
        Reply::Fault { status } => println!("fault: {status}"),
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
