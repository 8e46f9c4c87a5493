//! Named, schema-validated actions an agent can discover and invoke.
//!
//! Providers own immutable tables of [`ActionDescriptor`]s. The
//! [`ActionRegistry`] flattens the providers that support the active network
//! into one ordered table and is the single dispatch point: every invocation
//! yields an [`ActionOutcome`], never an error or a panic.

use crate::{
    errors::{AavekitError, ToolError},
    networks::{NetworkConfig, NetworkTable},
    wallet::{Network, TxPlan, WalletProvider},
};
use alloy::{
    primitives::{Address, Bytes, B256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::{collections::HashSet, future::Future, time::Duration};
use tracing::{info, warn};

mod aave;
mod calldata;
mod preflight;
mod request;
mod weth;

pub use aave::AaveActionProvider;
pub use request::{ActionInput, InputKind};
pub use weth::WethActionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input: InputKind,
}

impl ActionDescriptor {
    pub fn input_schema(&self) -> Value {
        self.input.schema()
    }

    pub fn to_json(&self) -> Value {
        json!({
          "name": self.name,
          "description": self.description,
          "inputSchema": self.input_schema(),
        })
    }
}

/// Result of one invocation; rendered to a single string at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Success {
        message: String,
        #[serde(skip_serializing_if = "Value::is_null")]
        data: Value,
    },
    Failure {
        #[serde(flatten)]
        error: ToolError,
    },
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self::Success {
            message: message.into(),
            data,
        }
    }

    pub fn failure(error: impl Into<ToolError>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error.code),
        }
    }

    pub fn render(&self) -> &str {
        match self {
            Self::Success { message, .. } => message,
            Self::Failure { error } => &error.message,
        }
    }
}

impl From<Result<Self, ToolError>> for ActionOutcome {
    fn from(r: Result<Self, ToolError>) -> Self {
        r.unwrap_or_else(|error| Self::Failure { error })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSettings {
    pub preflight: bool,
    pub wait_for_confirmation: bool,
    pub call_timeout: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            preflight: true,
            wait_for_confirmation: true,
            call_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

/// A transaction the wallet accepted (and, if configured, that was mined).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub hash: B256,
    pub block_number: Option<u64>,
}

impl Submitted {
    pub fn confirmation_line(&self) -> String {
        self.block_number
            .map(|n| format!("\nConfirmed in block {n}."))
            .unwrap_or_default()
    }
}

/// Everything an action needs for one invocation.
pub struct ActionContext<'a> {
    pub wallet: &'a dyn WalletProvider,
    pub networks: &'a NetworkTable,
    pub settings: ActionSettings,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        wallet: &'a dyn WalletProvider,
        networks: &'a NetworkTable,
        settings: ActionSettings,
    ) -> Self {
        Self {
            wallet,
            networks,
            settings,
        }
    }

    /// Market addresses for the wallet's current network.
    pub fn market(&self) -> &'a NetworkConfig {
        self.networks
            .resolve(self.wallet.network().network_id.as_deref())
    }

    pub fn user(&self) -> Address {
        self.wallet.address()
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = eyre::Result<T>> + Send,
        limit: Duration,
        operation: &'static str,
        code: &'static str,
    ) -> Result<T, ToolError> {
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(ToolError::new(code, format!("{e:#}"))),
            Err(_elapsed) => Err(AavekitError::Timeout {
                operation,
                after: limit,
            }
            .into()),
        }
    }

    /// Call a view function and decode its return value.
    pub async fn read<C>(
        &self,
        to: Address,
        call: &C,
        what: &'static str,
    ) -> Result<C::Return, ToolError>
    where
        C: SolCall + Sync,
    {
        let data: Bytes = call.abi_encode().into();
        let out = self
            .bounded(
                self.wallet.call(to, data),
                self.settings.call_timeout,
                what,
                "rpc_error",
            )
            .await?;
        C::abi_decode_returns(&out)
            .map_err(|e| ToolError::new("rpc_error", format!("decode {what}: {e}")))
    }

    /// Hand a transaction to the wallet and optionally wait for it to be mined.
    pub async fn submit(&self, plan: TxPlan, what: &'static str) -> Result<Submitted, ToolError> {
        let to = plan.to;
        let hash = self
            .bounded(
                self.wallet.send_transaction(plan),
                self.settings.call_timeout,
                what,
                "wallet_error",
            )
            .await?;
        info!(operation = what, %to, tx_hash = %hash, "transaction submitted");

        if !self.settings.wait_for_confirmation {
            return Ok(Submitted {
                hash,
                block_number: None,
            });
        }

        // From here on the transaction is on its way; every failure names it
        // so the caller can check it instead of sending again.
        let receipt = self
            .bounded(
                self.wallet.wait_for_transaction(hash),
                self.settings.confirmation_timeout,
                "confirmation",
                "rpc_error",
            )
            .await
            .map_err(|e| {
                warn!(operation = what, tx_hash = %hash, code = e.code, "confirmation failed");
                ToolError::new(
                    e.code,
                    format!(
                        "transaction {hash} was submitted, but {}; check its status before resending",
                        e.message
                    ),
                )
                .with_data(json!({ "tx_hash": hash.to_string(), "submitted": true }))
            })?;
        if !receipt.success {
            warn!(operation = what, tx_hash = %receipt.tx_hash, "transaction reverted");
            return Err(ToolError::from(AavekitError::Reverted(hash))
                .with_data(json!({ "tx_hash": hash.to_string(), "submitted": true })));
        }
        info!(
            operation = what,
            tx_hash = %receipt.tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        Ok(Submitted {
            hash,
            block_number: receipt.block_number,
        })
    }
}

#[async_trait]
pub trait ActionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ordered, immutable action table.
    fn actions(&self) -> &[ActionDescriptor];

    fn supports_network(&self, network: &Network) -> bool {
        network.is_evm()
    }

    /// `input` has already been validated against the action's [`InputKind`].
    async fn invoke(
        &self,
        action: &str,
        input: ActionInput,
        ctx: &ActionContext<'_>,
    ) -> ActionOutcome;
}

pub fn default_providers() -> Vec<Box<dyn ActionProvider>> {
    vec![Box::new(AaveActionProvider), Box::new(WethActionProvider)]
}

/// Providers for one network, flattened into a single ordered name table.
pub struct ActionRegistry {
    providers: Vec<Box<dyn ActionProvider>>,
    // (provider index, action index) in listing order
    index: Vec<(usize, usize)>,
}

impl ActionRegistry {
    pub fn new(providers: Vec<Box<dyn ActionProvider>>, network: &Network) -> eyre::Result<Self> {
        let providers: Vec<_> = providers
            .into_iter()
            .filter(|p| {
                let ok = p.supports_network(network);
                if !ok {
                    warn!(
                        provider = p.name(),
                        network = %network.protocol_family,
                        "provider does not support network"
                    );
                }
                ok
            })
            .collect();

        let mut seen = HashSet::new();
        let mut index = Vec::new();
        for (pi, p) in providers.iter().enumerate() {
            for (ai, a) in p.actions().iter().enumerate() {
                if !seen.insert(a.name) {
                    eyre::bail!("duplicate action name: {} (provider {})", a.name, p.name());
                }
                index.push((pi, ai));
            }
        }
        Ok(Self { providers, index })
    }

    fn entry(&self, (pi, ai): (usize, usize)) -> Option<(&dyn ActionProvider, &ActionDescriptor)> {
        let p = self.providers.get(pi)?;
        let a = p.actions().get(ai)?;
        Some((p.as_ref(), a))
    }

    /// Same order on every call.
    pub fn list(&self) -> Vec<&ActionDescriptor> {
        self.index
            .iter()
            .filter_map(|&ix| self.entry(ix).map(|(_, a)| a))
            .collect()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn lookup(&self, name: &str) -> Option<(&dyn ActionProvider, &ActionDescriptor)> {
        self.index
            .iter()
            .filter_map(|&ix| self.entry(ix))
            .find(|(_, a)| a.name == name)
    }

    pub async fn invoke(&self, name: &str, args: Value, ctx: &ActionContext<'_>) -> ActionOutcome {
        let Some((provider, action)) = self.lookup(name) else {
            warn!(action = name, "unknown action");
            return ActionOutcome::failure(AavekitError::UnknownAction(name.to_owned()));
        };
        let input = match action.input.parse(args) {
            Ok(input) => input,
            Err(e) => {
                warn!(action = name, error = %e, "rejected action input");
                return ActionOutcome::failure(e);
            }
        };

        info!(
            provider = provider.name(),
            action = name,
            network = %ctx.market().network_id,
            "invoking action"
        );
        let outcome = provider.invoke(name, input, ctx).await;
        match outcome.code() {
            None => info!(action = name, "action succeeded"),
            Some(code) => warn!(action = name, code, detail = outcome.render(), "action failed"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests;
