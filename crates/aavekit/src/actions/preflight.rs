//! Advisory checks that mirror the pool's own validation before a transaction
//! is submitted. The chain remains authoritative: if the state cannot be read
//! the check is skipped and the transaction goes out anyway.

use super::ActionContext;
use crate::{
    amount::format_weth,
    contracts::{
        IAavePoolV3, IScaledBalanceToken, IERC20, HEALTH_FACTOR_ONE, RESERVE_ACTIVE_BIT,
        RESERVE_BORROWING_ENABLED_BIT, RESERVE_FROZEN_BIT, RESERVE_PAUSED_BIT,
    },
    errors::{AavekitError, ToolError},
};
use alloy::primitives::{Address, U256};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOperation {
    Supply,
    Withdraw,
    Borrow,
    Repay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveStatus {
    pub id: u16,
    pub active: bool,
    pub frozen: bool,
    pub paused: bool,
    pub borrowing_enabled: bool,
    pub a_token: Address,
    pub variable_debt_token: Address,
    pub available_liquidity: U256,
}

impl ReserveStatus {
    pub fn from_configuration(
        configuration: U256,
        id: u16,
        a_token: Address,
        variable_debt_token: Address,
    ) -> Self {
        Self {
            id,
            active: configuration.bit(RESERVE_ACTIVE_BIT),
            frozen: configuration.bit(RESERVE_FROZEN_BIT),
            paused: configuration.bit(RESERVE_PAUSED_BIT),
            borrowing_enabled: configuration.bit(RESERVE_BORROWING_ENABLED_BIT),
            a_token,
            variable_debt_token,
            available_liquidity: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStatus {
    pub scaled_a_token_balance: U256,
    pub scaled_variable_debt: U256,
    pub usage_as_collateral: bool,
    pub health_factor: U256,
}

fn reject(msg: impl Into<String>) -> Result<(), AavekitError> {
    Err(AavekitError::Precondition(msg.into()))
}

pub fn evaluate(
    op: PoolOperation,
    reserve: &ReserveStatus,
    user: &UserStatus,
) -> Result<(), AavekitError> {
    if !reserve.active {
        return reject("the WETH reserve is not active");
    }
    if reserve.paused {
        return reject("the WETH reserve is paused");
    }
    let hf_at_or_below_one = user.health_factor <= HEALTH_FACTOR_ONE;

    match op {
        PoolOperation::Supply => {
            if reserve.frozen {
                return reject("the WETH reserve is frozen; new supplies are disabled");
            }
        }
        PoolOperation::Withdraw => {
            if user.scaled_a_token_balance.is_zero() {
                return reject("no WETH supplied to Aave, nothing to withdraw");
            }
            if user.usage_as_collateral && hf_at_or_below_one {
                return reject(format!(
                    "health factor {} is at or below 1.0; withdrawing collateral is not allowed",
                    format_weth(user.health_factor)
                ));
            }
        }
        PoolOperation::Borrow => {
            if !reserve.borrowing_enabled {
                return reject("borrowing is disabled for the WETH reserve");
            }
            if reserve.frozen {
                return reject("the WETH reserve is frozen; new borrows are disabled");
            }
            if reserve.available_liquidity.is_zero() {
                return reject("no WETH liquidity is available to borrow");
            }
            if hf_at_or_below_one {
                return reject(format!(
                    "health factor {} is at or below 1.0; borrowing is not allowed",
                    format_weth(user.health_factor)
                ));
            }
        }
        PoolOperation::Repay => {
            if user.scaled_variable_debt.is_zero() {
                return reject("no variable WETH debt to repay");
            }
        }
    }
    Ok(())
}

async fn load(ctx: &ActionContext<'_>) -> Result<(ReserveStatus, UserStatus), ToolError> {
    let market = ctx.market();
    let user = ctx.user();

    let rd = ctx
        .read(
            market.pool,
            &IAavePoolV3::getReserveDataCall { asset: market.weth },
            "getReserveData",
        )
        .await?;
    let mut reserve = ReserveStatus::from_configuration(
        rd.configuration,
        rd.id,
        rd.aTokenAddress,
        rd.variableDebtTokenAddress,
    );
    reserve.available_liquidity = ctx
        .read(
            market.weth,
            &IERC20::balanceOfCall {
                account: reserve.a_token,
            },
            "reserve liquidity",
        )
        .await?;

    let account = ctx
        .read(
            market.pool,
            &IAavePoolV3::getUserAccountDataCall { user },
            "getUserAccountData",
        )
        .await?;
    let user_config = ctx
        .read(
            market.pool,
            &IAavePoolV3::getUserConfigurationCall { user },
            "getUserConfiguration",
        )
        .await?;
    let scaled_a_token_balance = ctx
        .read(
            reserve.a_token,
            &IScaledBalanceToken::scaledBalanceOfCall { user },
            "aToken scaledBalanceOf",
        )
        .await?;
    let scaled_variable_debt = ctx
        .read(
            reserve.variable_debt_token,
            &IScaledBalanceToken::scaledBalanceOfCall { user },
            "debt token scaledBalanceOf",
        )
        .await?;

    let status = UserStatus {
        scaled_a_token_balance,
        scaled_variable_debt,
        usage_as_collateral: user_config.bit(usize::from(reserve.id) * 2 + 1),
        health_factor: account.healthFactor,
    };
    Ok((reserve, status))
}

/// Run the advisory check for `op` if enabled.
pub async fn check(op: PoolOperation, ctx: &ActionContext<'_>) -> Result<(), ToolError> {
    if !ctx.settings.preflight {
        return Ok(());
    }
    match load(ctx).await {
        Ok((reserve, user)) => {
            debug!(?op, ?reserve, ?user, "preflight state");
            evaluate(op, &reserve, &user).map_err(Into::into)
        }
        Err(e) => {
            warn!(
                ?op,
                code = e.code,
                error = %e.message,
                "preflight read failed; submitting anyway"
            );
            Ok(())
        }
    }
}
