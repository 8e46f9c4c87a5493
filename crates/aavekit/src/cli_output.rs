//! Human-facing output on stderr. stdout carries MCP frames and command results.

use crate::{actions::ActionDescriptor, networks::NetworkConfig};
use std::io::Write as _;

fn stderr_writeln(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    if stderr.write_all(b"\n").is_err() {
        return;
    }
    let _flush = stderr.flush();
}

pub fn print_mcp_banner(version: &str, market: &NetworkConfig, signer: &str, action_count: usize) {
    stderr_writeln(&format!(
        "aavekit MCP\n===========\n\
         Version : v{version}\n\
         Network : {} (chain {})\n\
         Pool    : {}\n\
         Signer  : {signer}\n\
         Actions : {action_count}\n\n\
         Tip: run `aavekit doctor` if the agent can't connect.",
        market.network_id, market.chain_id, market.pool
    ));
}

/// One action per line, name then description, names padded to align.
pub fn write_action_table(
    out: &mut impl std::io::Write,
    actions: &[&ActionDescriptor],
) -> eyre::Result<()> {
    let width = actions.iter().map(|a| a.name.len()).max().unwrap_or(0);
    for a in actions {
        writeln!(out, "{:<width$}  {}", a.name, a.description)?;
    }
    Ok(())
}
