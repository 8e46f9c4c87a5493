use crate::{
    actions::ActionSettings,
    networks::{NetworkDef, NetworkTable, DEFAULT_NETWORK_ID},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

pub const BASE_SEPOLIA_RPC_URL: &str = "https://sepolia.base.org";
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "AAVEKIT_PRIVATE_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AavekitConfig {
    /// Network the wallet connects to. Unknown ids fall back to base-sepolia.
    pub network_id: String,
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub actions: ActionsConfig,
    /// Extra or replacement market address sets.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, NetworkDef>,
}

impl Default for AavekitConfig {
    fn default() -> Self {
        Self {
            network_id: DEFAULT_NETWORK_ID.to_owned(),
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            actions: ActionsConfig::default(),
            networks: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// network id -> JSON-RPC endpoint
    pub urls: BTreeMap<String, String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        let mut urls = BTreeMap::new();
        urls.insert(DEFAULT_NETWORK_ID.to_owned(), BASE_SEPOLIA_RPC_URL.to_owned());
        Self { urls }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key. The key
    /// itself is never written to disk.
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: DEFAULT_PRIVATE_KEY_ENV.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub preflight: bool,
    pub wait_for_confirmation: bool,
    pub call_timeout_seconds: u64,
    pub confirmation_timeout_seconds: u64,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            preflight: true,
            wait_for_confirmation: true,
            call_timeout_seconds: 30,
            confirmation_timeout_seconds: 120,
        }
    }
}

impl ActionsConfig {
    pub fn settings(&self) -> ActionSettings {
        ActionSettings {
            preflight: self.preflight,
            wait_for_confirmation: self.wait_for_confirmation,
            call_timeout: Duration::from_secs(self.call_timeout_seconds.max(1)),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_seconds.max(1)),
        }
    }
}

impl AavekitConfig {
    pub fn network_table(&self) -> NetworkTable {
        NetworkTable::with_overrides(&self.networks)
    }

    pub fn rpc_url_for(&self, network_id: &str) -> Option<&str> {
        self.rpc
            .urls
            .get(network_id)
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
    }
}
