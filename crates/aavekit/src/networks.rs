//! Per-network Aave V3 market addresses.
//!
//! The table is built once at startup from the built-in entries plus any
//! `[networks.<id>]` sections in `config.toml`, and never changes afterwards.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_NETWORK_ID: &str = "base-sepolia";
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84_532;

/// Addresses for one network. Also the shape of a `[networks.<id>]` config entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDef {
    pub chain_id: u64,
    pub pool: Address,
    pub weth: Address,
    pub a_weth: Address,
    pub variable_debt_weth: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub network_id: String,
    pub chain_id: u64,
    pub pool: Address,
    pub weth: Address,
    pub a_weth: Address,
    pub variable_debt_weth: Address,
}

impl NetworkConfig {
    fn from_def(network_id: &str, def: &NetworkDef) -> Self {
        Self {
            network_id: network_id.to_owned(),
            chain_id: def.chain_id,
            pool: def.pool,
            weth: def.weth,
            a_weth: def.a_weth,
            variable_debt_weth: def.variable_debt_weth,
        }
    }
}

pub fn base_sepolia() -> NetworkConfig {
    NetworkConfig {
        network_id: DEFAULT_NETWORK_ID.to_owned(),
        chain_id: BASE_SEPOLIA_CHAIN_ID,
        pool: address!("07ea79f68b2b3df564d0a34f8e19d9b1e339814b"),
        weth: address!("4200000000000000000000000000000000000006"),
        a_weth: address!("96e32de4b1d1617b8c2ae13a88b9cc287239b13f"),
        variable_debt_weth: address!("f0f0025dc51f532ab84c33eb9d01583eaa0f74c7"),
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone)]
pub struct NetworkTable {
    entries: BTreeMap<String, NetworkConfig>,
    fallback: NetworkConfig,
}

impl NetworkTable {
    pub fn builtin() -> Self {
        let fallback = base_sepolia();
        let mut entries = BTreeMap::new();
        entries.insert(fallback.network_id.clone(), fallback.clone());
        Self { entries, fallback }
    }

    /// Built-in entries plus config entries. A config entry replaces the
    /// built-in one with the same id.
    pub fn with_overrides(defs: &BTreeMap<String, NetworkDef>) -> Self {
        let mut table = Self::builtin();
        for (id, def) in defs {
            let id = normalize_id(id);
            if id.is_empty() {
                continue;
            }
            let cfg = NetworkConfig::from_def(&id, def);
            if id == DEFAULT_NETWORK_ID {
                table.fallback = cfg.clone();
            }
            table.entries.insert(id, cfg);
        }
        table
    }

    /// Look up a network; absent or unknown ids resolve to the default network.
    pub fn resolve(&self, network_id: Option<&str>) -> &NetworkConfig {
        network_id
            .map(normalize_id)
            .and_then(|id| self.entries.get(&id))
            .unwrap_or(&self.fallback)
    }

    pub fn contains(&self, network_id: &str) -> bool {
        self.entries.contains_key(&normalize_id(network_id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
