//! Recording wallet for tests.

use super::{Network, TxPlan, TxReceiptSummary, WalletProvider};
use alloy::primitives::{address, Address, Bytes, B256};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

pub const MOCK_USER: Address = address!("00000000000000000000000000000000000000aa");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendBehavior {
    Accept,
    Hang,
}

pub struct MockWallet {
    network: Network,
    reads: HashMap<(Address, [u8; 4]), Bytes>,
    send_error: Option<String>,
    send_behavior: SendBehavior,
    confirmations_hang: bool,
    receipt_success: bool,
    sent: Mutex<Vec<TxPlan>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            network: Network::evm("base-sepolia", 84_532),
            reads: HashMap::new(),
            send_error: None,
            send_behavior: SendBehavior::Accept,
            confirmations_hang: false,
            receipt_success: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn on_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Answer `eth_call`s to `to` with this selector.
    pub fn with_read(mut self, to: Address, selector: [u8; 4], ret: Vec<u8>) -> Self {
        self.reads.insert((to, selector), ret.into());
        self
    }

    pub fn rejecting_sends(mut self, reason: &str) -> Self {
        self.send_error = Some(reason.to_owned());
        self
    }

    pub fn hanging_sends(mut self) -> Self {
        self.send_behavior = SendBehavior::Hang;
        self
    }

    /// Sends succeed but the receipt never arrives.
    pub fn hanging_confirmations(mut self) -> Self {
        self.confirmations_hang = true;
        self
    }

    pub fn reverting(mut self) -> Self {
        self.receipt_success = false;
        self
    }

    pub async fn sent(&self) -> Vec<TxPlan> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn address(&self) -> Address {
        MOCK_USER
    }

    fn network(&self) -> Network {
        self.network.clone()
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| eyre::eyre!("calldata shorter than a selector"))?;
        self.reads
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| eyre::eyre!("no mock response for {to} 0x{}", hex::encode(selector)))
    }

    async fn send_transaction(&self, tx: TxPlan) -> eyre::Result<B256> {
        if self.send_behavior == SendBehavior::Hang {
            std::future::pending::<()>().await;
        }
        if let Some(reason) = &self.send_error {
            eyre::bail!("{reason}");
        }
        let mut sent = self.sent.lock().await;
        sent.push(tx);
        let n = u8::try_from(sent.len()).unwrap_or(u8::MAX);
        Ok(B256::repeat_byte(n))
    }

    async fn wait_for_transaction(&self, hash: B256) -> eyre::Result<TxReceiptSummary> {
        if self.confirmations_hang {
            std::future::pending::<()>().await;
        }
        Ok(TxReceiptSummary {
            tx_hash: hash,
            block_number: Some(1_234),
            gas_used: 21_000,
            success: self.receipt_success,
        })
    }
}
