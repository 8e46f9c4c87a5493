use super::{
    calldata,
    preflight::{self, PoolOperation},
    ActionContext, ActionDescriptor, ActionInput, ActionOutcome, ActionProvider, InputKind,
    Submitted,
};
use crate::{
    amount::{
        format_amount_base_to_ui_string, format_weth, parse_allowance_amount,
        parse_positive_weth_amount, WETH_UNITS,
    },
    contracts::{IAavePoolV3, IERC20},
    errors::{AavekitError, ToolError},
    networks::NetworkConfig,
    wallet::TxPlan,
};
use alloy::primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Value};

const AMOUNT_WETH: InputKind = InputKind::Amount {
    description: "Amount of WETH as a decimal string, e.g. \"0.1\"",
};

static ACTIONS: [ActionDescriptor; 11] = [
    ActionDescriptor {
        name: "check_weth_balance",
        description: "Check the wallet's WETH balance.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "check_atoken_balance",
        description: "Check the wallet's aWETH balance, i.e. how much WETH is supplied to Aave including accrued interest.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "check_debt_balance",
        description: "Check the wallet's outstanding variable-rate WETH debt on Aave.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "check_weth_allowance",
        description: "Check how much WETH the Aave pool is allowed to pull from the wallet.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "approve_weth_for_aave",
        description: "Approve the Aave pool to spend WETH from the wallet. Required before supply_weth and repay_weth. Accepts \"max\" for an unlimited approval.",
        input: InputKind::Amount {
            description: "Amount of WETH to approve as a decimal string, or \"max\"",
        },
    },
    ActionDescriptor {
        name: "supply_weth",
        description: "Supply WETH to Aave to earn interest and use it as collateral.",
        input: AMOUNT_WETH,
    },
    ActionDescriptor {
        name: "withdraw_weth",
        description: "Withdraw previously supplied WETH from Aave back to the wallet.",
        input: AMOUNT_WETH,
    },
    ActionDescriptor {
        name: "borrow_weth",
        description: "Borrow WETH from Aave at a variable interest rate against supplied collateral.",
        input: AMOUNT_WETH,
    },
    ActionDescriptor {
        name: "repay_weth",
        description: "Repay part of the wallet's variable-rate WETH debt on Aave.",
        input: AMOUNT_WETH,
    },
    ActionDescriptor {
        name: "repay_all_weth",
        description: "Repay all of the wallet's variable-rate WETH debt on Aave, including accrued interest.",
        input: InputKind::Empty,
    },
    ActionDescriptor {
        name: "get_user_account_data",
        description: "Show the wallet's Aave account summary: collateral, debt, borrowing power, LTV and health factor.",
        input: InputKind::Empty,
    },
];

/// Aave V3 WETH market actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AaveActionProvider;

#[async_trait]
impl ActionProvider for AaveActionProvider {
    fn name(&self) -> &'static str {
        "aave"
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
            "check_weth_balance" => check_weth_balance(ctx).await,
            "check_atoken_balance" => check_atoken_balance(ctx).await,
            "check_debt_balance" => check_debt_balance(ctx).await,
            "check_weth_allowance" => check_weth_allowance(ctx).await,
            "approve_weth_for_aave" => approve(ctx, &input).await,
            "supply_weth" => supply(ctx, &input).await,
            "withdraw_weth" => withdraw(ctx, &input).await,
            "borrow_weth" => borrow(ctx, &input).await,
            "repay_weth" => repay(ctx, &input).await,
            "repay_all_weth" => repay_all(ctx).await,
            "get_user_account_data" => user_account_data(ctx).await,
            other => Err(AavekitError::UnknownAction(other.to_owned()).into()),
        };
        r.into()
    }
}

fn tx_data(market: &NetworkConfig, sent: &Submitted, amount: U256) -> Value {
    json!({
      "network": market.network_id,
      "tx_hash": sent.hash.to_string(),
      "block_number": sent.block_number,
      "amount_wei": amount.to_string(),
    })
}

fn weth_amount(input: &ActionInput, what: &str) -> Result<U256, ToolError> {
    let raw = input.amount().map_err(|e| e.context(what))?;
    parse_positive_weth_amount(raw, WETH_UNITS).map_err(|e| ToolError::from(e).context(what))
}

/// Shared path for the pool write actions: advisory check, then submit.
async fn pool_write(
    ctx: &ActionContext<'_>,
    op: PoolOperation,
    plan: TxPlan,
    what: &'static str,
    err_prefix: &str,
) -> Result<Submitted, ToolError> {
    preflight::check(op, ctx)
        .await
        .map_err(|e| e.context(err_prefix))?;
    ctx.submit(plan, what)
        .await
        .map_err(|e| e.context(err_prefix))
}

async fn check_weth_balance(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    let m = ctx.market();
    let user = ctx.user();
    let bal = ctx
        .read(m.weth, &IERC20::balanceOfCall { account: user }, "WETH balanceOf")
        .await
        .map_err(|e| e.context("Error checking WETH balance"))?;
    let ui = format_weth(bal);
    Ok(ActionOutcome::success(
        format!("WETH balance: {ui} WETH"),
        json!({
            "network": m.network_id,
            "address": user.to_string(),
            "balance": ui,
            "balance_wei": bal.to_string(),
        }),
    ))
}

async fn check_atoken_balance(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error checking aWETH balance";
    let m = ctx.market();
    let user = ctx.user();
    let bal = ctx
        .read(m.a_weth, &IERC20::balanceOfCall { account: user }, "aWETH balanceOf")
        .await
        .map_err(|e| e.context(ERR))?;
    let decimals = ctx
        .read(m.a_weth, &IERC20::decimalsCall {}, "aWETH decimals")
        .await
        .map_err(|e| e.context(ERR))?;
    let ui = format_amount_base_to_ui_string(bal, decimals).unwrap_or_else(|_| bal.to_string());
    Ok(ActionOutcome::success(
        format!("aWETH balance: {ui} aWETH (WETH supplied to Aave, including interest)"),
        json!({
            "network": m.network_id,
            "address": user.to_string(),
            "balance": ui,
            "balance_wei": bal.to_string(),
            "decimals": decimals,
        }),
    ))
}

async fn check_debt_balance(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    let m = ctx.market();
    let user = ctx.user();
    let debt = ctx
        .read(
            m.variable_debt_weth,
            &IERC20::balanceOfCall { account: user },
            "variable debt balanceOf",
        )
        .await
        .map_err(|e| e.context("Error checking WETH debt"))?;
    let ui = format_weth(debt);
    let message = if debt.is_zero() {
        "No outstanding variable WETH debt on Aave.".to_owned()
    } else {
        format!("Outstanding variable WETH debt: {ui} WETH")
    };
    Ok(ActionOutcome::success(
        message,
        json!({
            "network": m.network_id,
            "address": user.to_string(),
            "debt": ui,
            "debt_wei": debt.to_string(),
        }),
    ))
}

async fn check_weth_allowance(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    let m = ctx.market();
    let user = ctx.user();
    let allowance = ctx
        .read(
            m.weth,
            &IERC20::allowanceCall {
                owner: user,
                spender: m.pool,
            },
            "WETH allowance",
        )
        .await
        .map_err(|e| e.context("Error checking WETH allowance"))?;
    let ui = if allowance == U256::MAX {
        "unlimited".to_owned()
    } else {
        format_weth(allowance)
    };
    Ok(ActionOutcome::success(
        format!("The Aave pool may spend {ui} WETH from this wallet."),
        json!({
            "network": m.network_id,
            "spender": m.pool.to_string(),
            "allowance": ui,
            "allowance_wei": allowance.to_string(),
        }),
    ))
}

async fn approve(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error approving WETH for Aave";
    let raw = input.amount().map_err(|e| e.context(ERR))?;
    let amount = parse_allowance_amount(raw).map_err(|e| ToolError::from(e).context(ERR))?;
    let m = ctx.market();
    let sent = ctx
        .submit(calldata::approve_pool(m, amount), "approve")
        .await
        .map_err(|e| e.context(ERR))?;
    let shown = if amount == U256::MAX {
        "unlimited".to_owned()
    } else {
        format!("{} WETH", format_weth(amount))
    };
    Ok(ActionOutcome::success(
        format!(
            "Approved the Aave pool to spend {shown}.\nTransaction hash: {}{}",
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, amount),
    ))
}

async fn supply(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error supplying WETH";
    let amount = weth_amount(input, ERR)?;
    let m = ctx.market();
    let plan = calldata::supply(m, amount, ctx.user());
    let sent = pool_write(ctx, PoolOperation::Supply, plan, "supply", ERR).await?;
    Ok(ActionOutcome::success(
        format!(
            "Supplied {} WETH to Aave.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, amount),
    ))
}

async fn withdraw(
    ctx: &ActionContext<'_>,
    input: &ActionInput,
) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error withdrawing WETH";
    let amount = weth_amount(input, ERR)?;
    let m = ctx.market();
    let plan = calldata::withdraw(m, amount, ctx.user());
    let sent = pool_write(ctx, PoolOperation::Withdraw, plan, "withdraw", ERR).await?;
    Ok(ActionOutcome::success(
        format!(
            "Withdrew {} WETH from Aave.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, amount),
    ))
}

async fn borrow(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error borrowing WETH";
    let amount = weth_amount(input, ERR)?;
    let m = ctx.market();
    let plan = calldata::borrow(m, amount, ctx.user());
    let sent = pool_write(ctx, PoolOperation::Borrow, plan, "borrow", ERR).await?;
    Ok(ActionOutcome::success(
        format!(
            "Borrowed {} WETH from Aave at a variable rate.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, amount),
    ))
}

async fn repay(ctx: &ActionContext<'_>, input: &ActionInput) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error repaying WETH";
    let amount = weth_amount(input, ERR)?;
    let m = ctx.market();
    let plan = calldata::repay(m, amount, ctx.user());
    let sent = pool_write(ctx, PoolOperation::Repay, plan, "repay", ERR).await?;
    Ok(ActionOutcome::success(
        format!(
            "Repaid {} WETH of variable debt on Aave.\nTransaction hash: {}{}",
            format_weth(amount),
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, amount),
    ))
}

async fn repay_all(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    const ERR: &str = "Error repaying all WETH debt";
    let m = ctx.market();
    let plan = calldata::repay(m, U256::MAX, ctx.user());
    let sent = pool_write(ctx, PoolOperation::Repay, plan, "repay all", ERR).await?;
    Ok(ActionOutcome::success(
        format!(
            "Repaid all variable WETH debt on Aave.\nTransaction hash: {}{}",
            sent.hash,
            sent.confirmation_line()
        ),
        tx_data(m, &sent, U256::MAX),
    ))
}

/// Aave reports collateral/debt in the market base currency with 8 decimals.
const BASE_CURRENCY_DECIMALS: u8 = 8;

async fn user_account_data(ctx: &ActionContext<'_>) -> Result<ActionOutcome, ToolError> {
    let m = ctx.market();
    let user = ctx.user();
    let d = ctx
        .read(
            m.pool,
            &IAavePoolV3::getUserAccountDataCall { user },
            "getUserAccountData",
        )
        .await
        .map_err(|e| e.context("Error reading Aave account data"))?;

    let base = |v: U256| {
        format_amount_base_to_ui_string(v, BASE_CURRENCY_DECIMALS).unwrap_or_else(|_| v.to_string())
    };
    // LTV and liquidation threshold are basis points.
    let pct = |v: U256| format_amount_base_to_ui_string(v, 2).unwrap_or_else(|_| v.to_string());
    let health = if d.totalDebtBase.is_zero() || d.healthFactor == U256::MAX {
        "no debt".to_owned()
    } else {
        format_weth(d.healthFactor)
    };

    let message = format!(
        "Aave account {user}:\n\
         Total collateral: {} (base currency)\n\
         Total debt: {} (base currency)\n\
         Available to borrow: {} (base currency)\n\
         Loan to value: {}%\n\
         Liquidation threshold: {}%\n\
         Health factor: {health}",
        base(d.totalCollateralBase),
        base(d.totalDebtBase),
        base(d.availableBorrowsBase),
        pct(d.ltv),
        pct(d.currentLiquidationThreshold),
    );
    Ok(ActionOutcome::success(
        message,
        json!({
          "network": m.network_id,
          "address": user.to_string(),
          "total_collateral_base": d.totalCollateralBase.to_string(),
          "total_debt_base": d.totalDebtBase.to_string(),
          "available_borrows_base": d.availableBorrowsBase.to_string(),
          "current_liquidation_threshold_bps": d.currentLiquidationThreshold.to_string(),
          "ltv_bps": d.ltv.to_string(),
          "health_factor": d.healthFactor.to_string(),
        }),
    ))
}
