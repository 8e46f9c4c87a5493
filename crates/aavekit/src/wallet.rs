use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::Serialize;

mod evm;
#[cfg(test)]
pub mod mock;

pub use evm::{private_key_from_env, EvmWallet};

pub const EVM_PROTOCOL_FAMILY: &str = "evm";

/// The network a wallet is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub protocol_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl Network {
    pub fn evm(network_id: &str, chain_id: u64) -> Self {
        Self {
            protocol_family: EVM_PROTOCOL_FAMILY.to_owned(),
            network_id: Some(network_id.to_owned()),
            chain_id: Some(chain_id),
        }
    }

    pub fn is_evm(&self) -> bool {
        self.protocol_family.eq_ignore_ascii_case(EVM_PROTOCOL_FAMILY)
    }
}

/// A contract call ready to hand to the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPlan {
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub value: U256,
}

impl TxPlan {
    pub fn call(to: Address, data: Vec<u8>, gas_limit: u64) -> Self {
        Self {
            to,
            data: data.into(),
            gas_limit,
            value: U256::ZERO,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceiptSummary {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
}

/// What the actions need from a wallet. Implementations must not retry on their own.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn address(&self) -> Address;

    fn network(&self) -> Network;

    /// `eth_call` against `to` with raw calldata.
    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes>;

    /// Sign and broadcast; resolves once the node accepted the transaction.
    async fn send_transaction(&self, tx: TxPlan) -> eyre::Result<B256>;

    /// Poll until the transaction is mined. Callers bound this with a timeout.
    async fn wait_for_transaction(&self, hash: B256) -> eyre::Result<TxReceiptSummary>;
}
