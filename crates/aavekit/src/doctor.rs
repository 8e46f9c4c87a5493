use crate::{
    config::AavekitConfig,
    networks::NetworkConfig,
    paths::AavekitPaths,
    runtime::Runtime,
    store::{apply_env_overrides, rpc_url_override},
};
use eyre::Context as _;
use serde::Serialize;
use serde_json::json;
use std::{fs, io::Write as _, path::Path, path::PathBuf};

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn try_parse_config(path: &Path) -> eyre::Result<AavekitConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    path: PathBuf,
    exists: bool,
    parse_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct NetworkReport {
    #[serde(flatten)]
    market: NetworkConfig,
    known_networks: Vec<String>,
    rpc_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignerReport {
    env_var: String,
    // Only whether the variable is set; the key is never read here.
    configured: bool,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    ok: bool,
    version: &'static str,
    paths: serde_json::Value,
    config: ConfigReport,
    network: NetworkReport,
    signer: SignerReport,
    providers: Vec<&'static str>,
    actions: Vec<&'static str>,
    env: serde_json::Value,
}

/// Diagnostics never create files: a missing config is reported, and the
/// defaults it would get are shown.
fn collect(paths: &AavekitPaths) -> eyre::Result<DoctorReport> {
    let config_path = paths.config_file();
    let exists = config_path.exists();
    let (cfg, error) = if exists {
        match try_parse_config(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AavekitConfig::default(), Some(format!("{e:#}"))),
        }
    } else {
        (AavekitConfig::default(), None)
    };

    // Same resolution as `mcp`/`invoke`, minus writing a default config.
    let mut cfg = cfg;
    apply_env_overrides(&mut cfg);
    let rt = Runtime::from_config(cfg, None).with_rpc_override(rpc_url_override());
    let registry = rt.registry()?;
    let env_var = rt.config.wallet.private_key_env.clone();

    Ok(DoctorReport {
        ok: error.is_none(),
        version: env!("CARGO_PKG_VERSION"),
        paths: json!({
          "config_dir": paths.config_dir,
          "data_dir": paths.data_dir,
          "log_file": paths.log_file,
        }),
        config: ConfigReport {
            path: config_path,
            exists,
            parse_ok: exists && error.is_none(),
            error,
        },
        network: NetworkReport {
            known_networks: rt.networks.ids().map(str::to_owned).collect(),
            rpc_url: rt.rpc_url().ok().map(str::to_owned),
            market: rt.market.clone(),
        },
        signer: SignerReport {
            configured: env_opt(&env_var).is_some(),
            env_var,
        },
        providers: registry.provider_names(),
        actions: registry.list().iter().map(|a| a.name).collect(),
        env: json!({
          "AAVEKIT_CONFIG_DIR": env_opt("AAVEKIT_CONFIG_DIR"),
          "AAVEKIT_DATA_DIR": env_opt("AAVEKIT_DATA_DIR"),
          "AAVEKIT_NETWORK_ID": env_opt("AAVEKIT_NETWORK_ID"),
          "AAVEKIT_RPC_URL": env_opt("AAVEKIT_RPC_URL"),
          "AAVEKIT_PRIVATE_KEY_ENV": env_opt("AAVEKIT_PRIVATE_KEY_ENV"),
          "RUST_LOG": env_opt("RUST_LOG"),
        }),
    })
}

fn print_human(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    writeln!(out, "aavekit doctor (v{})", r.version).context("write header")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Config:").context("write config header")?;
    writeln!(out, "  path:     {}", r.config.path.display()).context("write config")?;
    writeln!(out, "  exists:   {}", r.config.exists).context("write config")?;
    if let Some(e) = &r.config.error {
        writeln!(out, "  error:    {e}").context("write config")?;
    }
    writeln!(out).context("write newline")?;

    let n = &r.network;
    writeln!(out, "Network:").context("write network header")?;
    writeln!(out, "  id:       {} (chain {})", n.market.network_id, n.market.chain_id)
        .context("write network")?;
    writeln!(out, "  pool:     {}", n.market.pool).context("write network")?;
    writeln!(out, "  weth:     {}", n.market.weth).context("write network")?;
    let rpc = n.rpc_url.as_deref().unwrap_or("(not configured)");
    writeln!(out, "  rpc:      {rpc}").context("write network")?;
    writeln!(out).context("write newline")?;

    let signer = if r.signer.configured { "set" } else { "NOT SET" };
    writeln!(out, "Signer:   {} is {signer}", r.signer.env_var).context("write signer")?;
    writeln!(out, "Actions:  {} ({})", r.actions.len(), r.providers.join(", "))
        .context("write actions")?;

    if !r.signer.configured {
        writeln!(out).context("write newline")?;
        writeln!(
            out,
            "Hint: export {}=0x<hex private key> before `aavekit mcp` or `aavekit invoke`.",
            r.signer.env_var
        )
        .context("write hint")?;
    }
    Ok(())
}

pub fn run(json: bool) -> eyre::Result<()> {
    let paths = AavekitPaths::discover()?;
    let report = collect(&paths)?;
    let mut stdout = std::io::stdout().lock();
    if json {
        let s = serde_json::to_string_pretty(&report).context("serialize doctor json")?;
        writeln!(stdout, "{s}").context("write doctor json")?;
    } else {
        print_human(&mut stdout, &report)?;
    }
    Ok(())
}
