use super::{Network, TxPlan, TxReceiptSummary, WalletProvider};
use crate::networks::NetworkConfig;
use alloy::{
    consensus::{SignableTransaction as _, TxEip1559, TxEnvelope, TxLegacy},
    eips::{eip2718::Encodable2718 as _, eip2930::AccessList},
    network::{TransactionBuilder as _},
    primitives::{Address, Bytes, TxKind, B256},
    providers::{Provider as _, RootProvider},
    rpc::types::{BlockNumberOrTag, TransactionRequest},
    signers::{local::PrivateKeySigner, SignerSync as _},
};
use async_trait::async_trait;
use eyre::Context as _;
use reqwest::Client;
use secrecy::{ExposeSecret as _, SecretString};
use std::{str::FromStr as _, time::Duration};
use tokio::time::sleep;
use tracing::debug;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeeQuote {
    Eip1559 { max_fee: u128, priority: u128 },
    Legacy { gas_price: u128 },
}

/// Prefer EIP-1559 when the chain reports a base fee.
///
/// priority = max(1.5 gwei, `gas_price` / 10), `max_fee` = `base_fee` * 2 + priority.
fn quote_fees(base_fee: Option<u128>, gas_price: u128) -> FeeQuote {
    let Some(base_fee) = base_fee else {
        return FeeQuote::Legacy { gas_price };
    };
    let min_priority: u128 = 1_500_000_000;
    let priority = std::cmp::max(min_priority, gas_price / 10);
    let max_fee = base_fee
        .saturating_mul(2)
        .saturating_add(priority)
        .max(base_fee.saturating_add(priority));
    FeeQuote::Eip1559 { max_fee, priority }
}

fn sign_plan(
    signer: &PrivateKeySigner,
    plan: &TxPlan,
    chain_id: u64,
    nonce: u64,
    fees: FeeQuote,
) -> eyre::Result<(TxEnvelope, B256)> {
    match fees {
        FeeQuote::Eip1559 { max_fee, priority } => {
            let tx = TxEip1559 {
                chain_id,
                nonce,
                gas_limit: plan.gas_limit,
                max_fee_per_gas: max_fee,
                max_priority_fee_per_gas: priority,
                to: TxKind::Call(plan.to),
                value: plan.value,
                access_list: AccessList::default(),
                input: plan.data.clone(),
            };
            let sig = signer
                .sign_hash_sync(&tx.signature_hash())
                .context("sign eip1559")?;
            let signed = tx.into_signed(sig);
            let hash = *signed.hash();
            Ok((TxEnvelope::Eip1559(signed), hash))
        }
        FeeQuote::Legacy { gas_price } => {
            let tx = TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price,
                gas_limit: plan.gas_limit,
                to: TxKind::Call(plan.to),
                value: plan.value,
                input: plan.data.clone(),
            };
            let sig = signer
                .sign_hash_sync(&tx.signature_hash())
                .context("sign legacy")?;
            let signed = tx.into_signed(sig);
            let hash = *signed.hash();
            Ok((TxEnvelope::Legacy(signed), hash))
        }
    }
}

fn broadcast_err_is_ok(err: &eyre::Report) -> bool {
    let s = format!("{err:#}").to_lowercase();
    s.contains("already known") || s.contains("known transaction") || s.contains("already imported")
}

/// Read a hex private key from `env_var`.
pub fn private_key_from_env(env_var: &str) -> eyre::Result<SecretString> {
    let raw = std::env::var(env_var)
        .with_context(|| format!("private key not set; export {env_var}=0x..."))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        eyre::bail!("private key env var {env_var} is empty");
    }
    Ok(SecretString::new(trimmed.into()))
}

/// JSON-RPC wallet with a local private-key signer.
pub struct EvmWallet {
    network: Network,
    chain_id: u64,
    provider: RootProvider,
    signer: PrivateKeySigner,
}

impl EvmWallet {
    pub fn connect(
        network: &NetworkConfig,
        rpc_url: &str,
        private_key: &SecretString,
    ) -> eyre::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.expose_secret())
            .map_err(|e| eyre::eyre!("invalid private key: {e}"))?;
        let provider = provider_for_url(rpc_url)?;
        Ok(Self {
            network: Network::evm(&network.network_id, network.chain_id),
            chain_id: network.chain_id,
            provider,
            signer,
        })
    }
}

fn provider_for_url(url: &str) -> eyre::Result<RootProvider> {
    let u: reqwest::Url = url
        .parse()
        .with_context(|| format!("invalid rpc url: {url}"))?;
    let client = Client::builder()
        .timeout(DEFAULT_RPC_TIMEOUT)
        .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
        .build()
        .context("build rpc http client")?;
    let http = alloy::transports::http::Http::with_client(client, u);
    let rpc_client = alloy::rpc::client::RpcClient::new(http, false);
    Ok(RootProvider::new(rpc_client))
}

#[async_trait]
impl WalletProvider for EvmWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn network(&self) -> Network {
        self.network.clone()
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let tx = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_input(data);
        let out = self.provider.call(tx).await.context("eth_call")?;
        Ok(out)
    }

    async fn send_transaction(&self, tx: TxPlan) -> eyre::Result<B256> {
        let from = self.address();

        let base_fee = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Pending)
            .await
            .ok()
            .flatten()
            .and_then(|b| b.header.base_fee_per_gas.map(u128::from));
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .context("get gas price")?;
        let fees = quote_fees(base_fee, gas_price);

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .context("get nonce")?;

        let (envelope, tx_hash) =
            sign_plan(&self.signer, &tx, self.chain_id, nonce, fees).context("sign tx")?;
        debug!(%tx_hash, nonce, ?fees, "broadcasting transaction");

        if let Err(e) = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
        {
            let report: eyre::Report = e.into();
            if !broadcast_err_is_ok(&report) {
                return Err(report).context("broadcast raw tx");
            }
        }
        Ok(tx_hash)
    }

    async fn wait_for_transaction(&self, hash: B256) -> eyre::Result<TxReceiptSummary> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .context("get transaction receipt")?;
            if let Some(r) = receipt {
                return Ok(TxReceiptSummary {
                    tx_hash: hash,
                    block_number: r.block_number,
                    gas_used: r.gas_used,
                    success: r.status(),
                });
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
