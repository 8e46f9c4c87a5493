#![recursion_limit = "256"]
#![expect(
    clippy::multiple_crate_versions,
    reason = "transitive dependency duplication"
)]

use clap::{Parser, Subcommand};
use eyre::Context as _;
use std::io::Write as _;
use tracing_subscriber::prelude::*;

mod actions;
mod amount;
mod cli_output;
mod config;
mod contracts;
mod doctor;
mod errors;
mod fsutil;
mod networks;
mod paths;
mod rpc;
mod runtime;
mod store;
mod wallet;

use crate::{runtime::Runtime, wallet::WalletProvider as _};

#[derive(Parser, Debug)]
#[command(name = "aavekit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the WETH and Aave actions to an agent host as MCP tools over stdio.
    Mcp {
        /// Network id for this session (overrides `network_id` in config.toml).
        #[arg(long)]
        network: Option<String>,
    },
    /// List the available actions. No wallet is needed.
    Actions {
        /// Print the MCP tool definitions as JSON.
        #[arg(long)]
        json: bool,
        #[arg(long)]
        network: Option<String>,
    },
    /// Invoke a single action with the configured wallet and print its result.
    Invoke {
        /// Action name, e.g. `supply_weth`.
        name: String,
        /// Arguments as a JSON object, e.g. '{"amount":"0.1"}'.
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        network: Option<String>,
        /// Print the full outcome as JSON instead of the rendered message.
        #[arg(long)]
        json: bool,
    },
    /// Print config/data/log paths as JSON.
    Paths,
    /// Check config, network, and signer setup.
    Doctor {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(paths: &paths::AavekitPaths) -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let file_name = paths
        .log_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("aavekit.log.jsonl");
    let file_appender = tracing_appender::rolling::never(&paths.data_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn parse_args(raw: Option<&str>) -> eyre::Result<serde_json::Value> {
    match raw.map(str::trim) {
        None | Some("") => Ok(serde_json::Value::Null),
        Some(s) => serde_json::from_str(s).context("--args must be valid JSON"),
    }
}

async fn serve_mcp(paths: &paths::AavekitPaths, network: Option<&str>) -> eyre::Result<()> {
    let rt = Runtime::load(paths, network)?;
    let registry = rt.registry()?;
    let wallet = rt.connect_wallet()?;
    cli_output::print_mcp_banner(
        env!("CARGO_PKG_VERSION"),
        &rt.market,
        &wallet.address().to_string(),
        registry.list().len(),
    );
    let ctx = rt.context(&wallet);
    rpc::mcp_server::run(&registry, &ctx).await
}

fn list_actions(
    paths: &paths::AavekitPaths,
    network: Option<&str>,
    json: bool,
) -> eyre::Result<()> {
    let rt = Runtime::load(paths, network)?;
    let registry = rt.registry()?;
    let actions = registry.list();
    let mut stdout = std::io::stdout().lock();
    if json {
        let tools: Vec<_> = actions.iter().map(|a| a.to_json()).collect();
        let s = serde_json::to_string_pretty(&tools).context("serialize actions")?;
        writeln!(stdout, "{s}").context("write actions")?;
    } else {
        cli_output::write_action_table(&mut stdout, &actions)?;
    }
    Ok(())
}

async fn invoke_once(
    paths: &paths::AavekitPaths,
    name: &str,
    args: Option<&str>,
    network: Option<&str>,
    json: bool,
) -> eyre::Result<()> {
    let args = parse_args(args)?;
    let rt = Runtime::load(paths, network)?;
    let registry = rt.registry()?;
    let wallet = rt.connect_wallet()?;
    let ctx = rt.context(&wallet);
    let outcome = registry.invoke(name, args, &ctx).await;

    let mut stdout = std::io::stdout().lock();
    if json {
        let s = serde_json::to_string_pretty(&outcome).context("serialize outcome")?;
        writeln!(stdout, "{s}").context("write outcome")?;
    } else {
        writeln!(stdout, "{}", outcome.render()).context("write outcome")?;
    }
    if let Some(code) = outcome.code() {
        eyre::bail!("action {name} failed ({code})");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = paths::AavekitPaths::discover()?;
    std::fs::create_dir_all(&paths.data_dir).context("create data dir")?;
    let _log_guard = init_logging(&paths);

    match cli.cmd {
        Command::Mcp { network } => serve_mcp(&paths, network.as_deref())
            .await
            .context("mcp server failed"),
        Command::Actions { json, network } => list_actions(&paths, network.as_deref(), json),
        Command::Invoke {
            name,
            args,
            network,
            json,
        } => invoke_once(&paths, &name, args.as_deref(), network.as_deref(), json).await,
        Command::Paths => {
            let s = serde_json::to_string(&serde_json::json!({
              "config_dir": paths.config_dir,
              "data_dir": paths.data_dir,
              "config_file": paths.config_file(),
              "log_file": paths.log_file,
            }))
            .context("serialize paths")?;
            writeln!(std::io::stdout().lock(), "{s}").context("write paths")?;
            Ok(())
        }
        Command::Doctor { json } => doctor::run(json).context("doctor failed"),
    }
}
