//! ABI fragments for the contracts the actions touch.

use alloy::{primitives::U256, sol};

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }
}

sol! {
    interface IWETH9 {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
    }
}

// getReserveData returns a struct of static fields; it is declared flat since
// the ABI encoding is identical.
sol! {
    interface IAavePoolV3 {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
        function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
        function repay(address asset, uint256 amount, uint256 interestRateMode, address onBehalfOf) external returns (uint256);

        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralBase,
            uint256 totalDebtBase,
            uint256 availableBorrowsBase,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );

        function getReserveData(address asset) external view returns (
            uint256 configuration,
            uint128 liquidityIndex,
            uint128 currentLiquidityRate,
            uint128 variableBorrowIndex,
            uint128 currentVariableBorrowRate,
            uint128 currentStableBorrowRate,
            uint40 lastUpdateTimestamp,
            uint16 id,
            address aTokenAddress,
            address stableDebtTokenAddress,
            address variableDebtTokenAddress,
            address interestRateStrategyAddress,
            uint128 accruedToTreasury,
            uint128 unbacked,
            uint128 isolationModeTotalDebt
        );

        function getUserConfiguration(address user) external view returns (uint256 data);
    }
}

sol! {
    interface IScaledBalanceToken {
        function scaledBalanceOf(address user) external view returns (uint256);
    }
}

/// Aave interest rate mode for variable-rate debt. Stable-rate borrowing is not used.
pub const VARIABLE_RATE_MODE: U256 = U256::from_limbs([2, 0, 0, 0]);
pub const REFERRAL_CODE: u16 = 0;

pub const APPROVE_GAS_LIMIT: u64 = 100_000;
pub const POOL_GAS_LIMIT: u64 = 300_000;
pub const WETH_GAS_LIMIT: u64 = 100_000;

/// Health factor of exactly 1.0 (18 decimals).
pub const HEALTH_FACTOR_ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

// Reserve configuration bitmap (Aave V3 ReserveConfiguration).
pub const RESERVE_ACTIVE_BIT: usize = 56;
pub const RESERVE_FROZEN_BIT: usize = 57;
pub const RESERVE_BORROWING_ENABLED_BIT: usize = 58;
pub const RESERVE_PAUSED_BIT: usize = 60;
