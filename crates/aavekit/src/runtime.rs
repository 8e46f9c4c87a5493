use crate::{
    actions::{default_providers, ActionContext, ActionRegistry, ActionSettings},
    config::AavekitConfig,
    networks::{NetworkConfig, NetworkTable},
    paths::AavekitPaths,
    store::{rpc_url_override, ConfigStore},
    wallet::{private_key_from_env, EvmWallet, Network},
};
use eyre::{Context as _, ContextCompat as _};
use tracing::warn;

/// Loaded config plus the resolved market for this process.
pub struct Runtime {
    pub config: AavekitConfig,
    pub networks: NetworkTable,
    pub market: NetworkConfig,
    rpc_override: Option<String>,
}

impl Runtime {
    /// `network` (from the command line) wins over the config file.
    pub fn load(paths: &AavekitPaths, network: Option<&str>) -> eyre::Result<Self> {
        paths.ensure_private_dirs()?;
        let config = ConfigStore::new(paths).load_or_init_default()?;
        Ok(Self::from_config(config, network).with_rpc_override(rpc_url_override()))
    }

    pub fn from_config(config: AavekitConfig, network: Option<&str>) -> Self {
        let networks = config.network_table();
        let requested = network.unwrap_or(&config.network_id);
        if !networks.contains(requested) {
            warn!(network = requested, "unknown network id, falling back to default market");
        }
        let market = networks.resolve(Some(requested)).clone();
        Self {
            config,
            networks,
            market,
            rpc_override: None,
        }
    }

    /// An endpoint that replaces the configured one for the active network,
    /// whichever network that turned out to be.
    pub fn with_rpc_override(self, url: Option<String>) -> Self {
        Self {
            rpc_override: url,
            ..self
        }
    }

    pub fn network(&self) -> Network {
        Network::evm(&self.market.network_id, self.market.chain_id)
    }

    pub fn settings(&self) -> ActionSettings {
        self.config.actions.settings()
    }

    pub fn registry(&self) -> eyre::Result<ActionRegistry> {
        ActionRegistry::new(default_providers(), &self.network())
    }

    pub fn rpc_url(&self) -> eyre::Result<&str> {
        if let Some(url) = &self.rpc_override {
            return Ok(url);
        }
        let id = &self.market.network_id;
        self.config.rpc_url_for(id).with_context(|| {
            format!(
                "no rpc url configured for {id}; set [rpc.urls] {id} in config.toml or AAVEKIT_RPC_URL"
            )
        })
    }

    pub fn connect_wallet(&self) -> eyre::Result<EvmWallet> {
        let key = private_key_from_env(&self.config.wallet.private_key_env)?;
        EvmWallet::connect(&self.market, self.rpc_url()?, &key)
            .with_context(|| format!("connect wallet on {}", self.market.network_id))
    }

    pub fn context<'a>(&'a self, wallet: &'a EvmWallet) -> ActionContext<'a> {
        ActionContext::new(wallet, &self.networks, self.settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_network_beats_config() {
        let mut cfg = AavekitConfig::default();
        cfg.network_id = "somewhere-else".to_owned();
        let rt = Runtime::from_config(cfg.clone(), Some("BASE-SEPOLIA"));
        assert_eq!(rt.market.network_id, "base-sepolia");

        // unknown ids resolve to the default market
        let rt = Runtime::from_config(cfg, None);
        assert_eq!(rt.market.chain_id, 84_532);
    }

    #[test]
    fn registry_lists_every_action() -> eyre::Result<()> {
        let rt = Runtime::from_config(AavekitConfig::default(), None);
        let reg = rt.registry()?;
        assert_eq!(reg.provider_names(), vec!["aave", "weth"]);
        assert_eq!(reg.list().len(), 14);
        Ok(())
    }

    fn with_local_fork() -> eyre::Result<AavekitConfig> {
        Ok(toml::from_str(
            r#"
[rpc.urls]
base-sepolia = "https://sepolia.base.org"
local-fork = "http://127.0.0.1:8545"

[networks.local-fork]
chain_id = 31337
pool = "0x1111111111111111111111111111111111111111"
weth = "0x2222222222222222222222222222222222222222"
a_weth = "0x3333333333333333333333333333333333333333"
variable_debt_weth = "0x4444444444444444444444444444444444444444"
"#,
        )?)
    }

    #[test]
    fn rpc_override_follows_the_command_line_network() -> eyre::Result<()> {
        let rt = Runtime::from_config(with_local_fork()?, Some("local-fork"));
        assert_eq!(rt.rpc_url()?, "http://127.0.0.1:8545");

        let rt = Runtime::from_config(with_local_fork()?, Some("local-fork"))
            .with_rpc_override(Some("http://override:1".to_owned()));
        assert_eq!(rt.market.network_id, "local-fork");
        assert_eq!(rt.rpc_url()?, "http://override:1");
        Ok(())
    }

    #[test]
    fn rpc_override_applies_after_network_fallback() -> eyre::Result<()> {
        let mut cfg = with_local_fork()?;
        cfg.network_id = "no-such-net".to_owned();
        let rt = Runtime::from_config(cfg, None)
            .with_rpc_override(Some("http://override:1".to_owned()));
        assert_eq!(rt.market.network_id, "base-sepolia");
        assert_eq!(rt.rpc_url()?, "http://override:1");
        Ok(())
    }

    #[test]
    fn missing_rpc_url_is_explained() -> eyre::Result<()> {
        let mut cfg = AavekitConfig::default();
        cfg.rpc.urls.clear();
        let rt = Runtime::from_config(cfg, None);
        let err = rt
            .rpc_url()
            .err()
            .ok_or_else(|| eyre::eyre!("expected missing rpc url"))?;
        assert!(err.to_string().contains("base-sepolia"), "{err}");
        Ok(())
    }
}
