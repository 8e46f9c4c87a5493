use super::{
    calldata, ActionContext, ActionDescriptor, ActionInput, ActionOutcome, ActionProvider,
    InputKind,
};
use crate::{
    amount::{
        format_amount_base_to_ui_string, format_weth, parse_positive_weth_amount, ETH_UNITS,
        WETH_UNITS,
    },
    contracts::IERC20,
    errors::{AavekitError, ToolError},
};
use async_trait::async_trait;
use serde_json::json;

static ACTIONS: [ActionDescriptor; 3] = [
    ActionDescriptor {
        name: "get_weth_balance",
        description: "Get the wallet's WETH token balance.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "wrap_eth",
        description: "Wrap native ETH into WETH by depositing it into the WETH contract.",
        input: InputKind::Amount {
            description: "Amount of ETH to wrap as a decimal string, e.g. \"0.01\"",
        },
    },
    ActionDescriptor {
        name: "unwrap_weth",
        description: "Unwrap WETH back into native ETH.",
        input: InputKind::Amount {
            description: "Amount of WETH to unwrap as a decimal string, e.g. \"0.01\"",
        },
    },
];

/// Wrapping and unwrapping native ETH.
#[derive(Debug, Clone, Copy, Default)]
pub struct WethActionProvider;

#[async_trait]
impl ActionProvider for WethActionProvider {
    fn name(&self) -> &'static str {
        "weth"
    }

    fn actions(&self) -> &[ActionDescriptor] {
        &ACTIONS
    }

    async fn invoke(
        &self,
        action: &str,
        input: ActionInput,
        ctx: &ActionContext<'_>,
    ) -> ActionOutcome {
        let r = match action {
            "get_weth_balance" => balance(ctx).await,
            "wrap_eth" => wrap(ctx, &input).await,
            "unwrap_weth" => unwrap(ctx, &input).await,
            other => Err(AavekitError::UnknownAction(other.to_owned()).into()),
        };
        r.into()
    }
}

async fn balance(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error getting WETH balance";
    let m = ctx.market();
    let user = ctx.user();
    let bal = ctx
        .read(m.weth, &IERC20::balanceOfCall { account: user }, "WETH balanceOf")
        .await
        .map_err(|e| e.context(ERR))?;
    let decimals = ctx
        .read(m.weth, &IERC20::decimalsCall {}, "WETH decimals")
        .await
        .map_err(|e| e.context(ERR))?;
    let ui = format_amount_base_to_ui_string(bal, decimals).unwrap_or_else(|_| bal.to_string());
    Ok(ActionOutcome::success(
        format!("WETH balance of {user}: {ui} WETH"),
        json!({
            "network": m.network_id,
            "address": user.to_string(),
            "balance": ui,
            "balance_wei": bal.to_string(),
        }),
    ))
}

async fn wrap(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error wrapping ETH";
    let raw = input.amount().map_err(|e| e.context(ERR))?;
    let amount =
        parse_positive_weth_amount(raw, ETH_UNITS).map_err(|e| ToolError::from(e).context(ERR))?;
    let m = ctx.market();
    let sent = ctx
        .submit(calldata::wrap_eth(m, amount), "wrap")
        .await
        .map_err(|e| e.context(ERR))?;
    Ok(ActionOutcome::success(
        format!(
            "Wrapped {} ETH into WETH.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        json!({
            "network": m.network_id,
            "tx_hash": sent.hash.to_string(),
            "block_number": sent.block_number,
            "amount_wei": amount.to_string(),
        }),
    ))
}

async fn unwrap(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error unwrapping WETH";
    let raw = input.amount().map_err(|e| e.context(ERR))?;
    let amount =
        parse_positive_weth_amount(raw, WETH_UNITS).map_err(|e| ToolError::from(e).context(ERR))?;
    let m = ctx.market();
    let sent = ctx
        .submit(calldata::unwrap_weth(m, amount), "unwrap")
        .await
        .map_err(|e| e.context(ERR))?;
    Ok(ActionOutcome::success(
        format!(
            "Unwrapped {} WETH into ETH.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        json!({
            "network": m.network_id,
            "tx_hash": sent.hash.to_string(),
            "block_number": sent.block_number,
            "amount_wei": amount.to_string(),
        }),
    ))
}
