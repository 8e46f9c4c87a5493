//! Pure transaction builders. Same inputs, same bytes.

use crate::{
    contracts::{
        IAavePoolV3, IWETH9, IERC20, APPROVE_GAS_LIMIT, POOL_GAS_LIMIT, REFERRAL_CODE,
        VARIABLE_RATE_MODE, WETH_GAS_LIMIT,
    },
    networks::NetworkConfig,
    wallet::TxPlan,
};
use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall as _,
};

/// Let the pool pull `amount` WETH from the user.
pub fn approve_pool(net: &NetworkConfig, amount: U256) -> TxPlan {
    let data = IERC20::approveCall {
        spender: net.pool,
        value: amount,
    }
    .abi_encode();
    TxPlan::call(net.weth, data, APPROVE_GAS_LIMIT)
}

pub fn supply(net: &NetworkConfig, amount: U256, on_behalf_of: Address) -> TxPlan {
    let data = IAavePoolV3::supplyCall {
        asset: net.weth,
        amount,
        onBehalfOf: on_behalf_of,
        referralCode: REFERRAL_CODE,
    }
    .abi_encode();
    TxPlan::call(net.pool, data, POOL_GAS_LIMIT)
}

pub fn withdraw(net: &NetworkConfig, amount: U256, to: Address) -> TxPlan {
    let data = IAavePoolV3::withdrawCall {
        asset: net.weth,
        amount,
        to,
    }
    .abi_encode();
    TxPlan::call(net.pool, data, POOL_GAS_LIMIT)
}

pub fn borrow(net: &NetworkConfig, amount: U256, on_behalf_of: Address) -> TxPlan {
    let data = IAavePoolV3::borrowCall {
        asset: net.weth,
        amount,
        interestRateMode: VARIABLE_RATE_MODE,
        referralCode: REFERRAL_CODE,
        onBehalfOf: on_behalf_of,
    }
    .abi_encode();
    TxPlan::call(net.pool, data, POOL_GAS_LIMIT)
}

/// `U256::MAX` repays the whole variable debt.
pub fn repay(net: &NetworkConfig, amount: U256, on_behalf_of: Address) -> TxPlan {
    let data = IAavePoolV3::repayCall {
        asset: net.weth,
        amount,
        interestRateMode: VARIABLE_RATE_MODE,
        onBehalfOf: on_behalf_of,
    }
    .abi_encode();
    TxPlan::call(net.pool, data, POOL_GAS_LIMIT)
}

pub fn wrap_eth(net: &NetworkConfig, amount: U256) -> TxPlan {
    TxPlan::call(net.weth, IWETH9::depositCall {}.abi_encode(), WETH_GAS_LIMIT).with_value(amount)
}

pub fn unwrap_weth(net: &NetworkConfig, amount: U256) -> TxPlan {
    let data = IWETH9::withdrawCall { wad: amount }.abi_encode();
    TxPlan::call(net.weth, data, WETH_GAS_LIMIT)
}
