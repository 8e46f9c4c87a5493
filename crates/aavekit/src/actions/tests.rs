use super::*;
use crate::{
    contracts::{
        IAavePoolV3, IScaledBalanceToken, IERC20, RESERVE_ACTIVE_BIT, RESERVE_BORROWING_ENABLED_BIT,
        RESERVE_FROZEN_BIT,
    },
    networks::base_sepolia,
    wallet::mock::{MockWallet, MOCK_USER},
};
use alloy::{
    primitives::{Address, U256},
    sol_types::{SolValue as _},
};
use serde_json::json;

const HALF_WETH: u128 = 500_000_000_000_000_000;

fn settings(preflight: bool) -> ActionSettings {
    ActionSettings {
        preflight,
        wait_for_confirmation: true,
        call_timeout: Duration::from_secs(5),
        confirmation_timeout: Duration::from_secs(5),
    }
}

async fn run(
    wallet: &MockWallet,
    name: &str,
    args: Value,
    settings: ActionSettings,
) -> eyre::Result<ActionOutcome> {
    let networks = NetworkTable::builtin();
    let registry = ActionRegistry::new(default_providers(), &wallet.network())?;
    let ctx = ActionContext::new(wallet, &networks, settings);
    Ok(registry.invoke(name, args, &ctx).await)
}

fn word(v: U256) -> Vec<u8> {
    v.abi_encode()
}

/// Reads needed by the pre-flight check, with the reserve config bits given.
fn with_pool_state(
    wallet: MockWallet,
    config_bits: &[usize],
    supplied: u64,
    debt: u64,
) -> MockWallet {
    let net = base_sepolia();
    let configuration = config_bits
        .iter()
        .fold(U256::ZERO, |acc, &b| acc | (U256::from(1_u8) << b));
    let reserve_id: u16 = 4;
    let reserve = (
        configuration,
        0_u128,
        0_u128,
        0_u128,
        0_u128,
        0_u128,
        0_u64,
        reserve_id,
        net.a_weth,
        Address::ZERO,
        net.variable_debt_weth,
        Address::ZERO,
        0_u128,
        0_u128,
        0_u128,
    )
        .abi_encode_params();
    let account = (
        U256::from(1_000_u64),
        U256::ZERO,
        U256::from(500_u64),
        U256::from(8_300_u64),
        U256::from(8_000_u64),
        U256::MAX,
    )
        .abi_encode_params();
    // collateral bit for reserve 4
    let user_config = U256::from(1_u8) << (usize::from(reserve_id) * 2 + 1);

    wallet
        .with_read(net.pool, IAavePoolV3::getReserveDataCall::SELECTOR, reserve)
        .with_read(net.pool, IAavePoolV3::getUserAccountDataCall::SELECTOR, account)
        .with_read(net.pool, IAavePoolV3::getUserConfigurationCall::SELECTOR, word(user_config))
        .with_read(net.weth, IERC20::balanceOfCall::SELECTOR, word(U256::from(10_u128.pow(20))))
        .with_read(
            net.a_weth,
            IScaledBalanceToken::scaledBalanceOfCall::SELECTOR,
            word(U256::from(supplied)),
        )
        .with_read(
            net.variable_debt_weth,
            IScaledBalanceToken::scaledBalanceOfCall::SELECTOR,
            word(U256::from(debt)),
        )
}

#[test]
fn list_is_ordered_unique_and_described() -> eyre::Result<()> {
    let registry = ActionRegistry::new(default_providers(), &Network::evm("base-sepolia", 84_532))?;
    let names: Vec<_> = registry.list().iter().map(|a| a.name).collect();
    assert_eq!(names.len(), 14);
    assert_eq!(names.first(), Some(&"check_weth_balance"));
    assert_eq!(names.last(), Some(&"unwrap_weth"));

    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len(), "duplicate action names: {names:?}");

    for a in registry.list() {
        assert!(!a.description.trim().is_empty(), "{} has no description", a.name);
        assert_eq!(a.input_schema()["type"], "object", "{} schema", a.name);
    }

    let again: Vec<_> = registry.list().iter().map(|a| a.name).collect();
    assert_eq!(names, again, "listing order must be stable");
    assert_eq!(registry.provider_names(), vec!["aave", "weth"]);
    Ok(())
}

#[test]
fn supports_only_evm_networks() -> eyre::Result<()> {
    let evm = Network::evm("base-sepolia", 84_532);
    let solana = Network {
        protocol_family: "solana".into(),
        network_id: Some("solana-devnet".into()),
        chain_id: None,
    };
    assert!(AaveActionProvider.supports_network(&evm));
    assert!(!AaveActionProvider.supports_network(&solana));
    assert!(!WethActionProvider.supports_network(&solana));

    let registry = ActionRegistry::new(default_providers(), &solana)?;
    assert!(registry.list().is_empty(), "no actions on a non-evm network");
    Ok(())
}

#[test]
fn duplicate_names_are_rejected() {
    let providers: Vec<Box<dyn ActionProvider>> =
        vec![Box::new(AaveActionProvider), Box::new(AaveActionProvider)];
    let r = ActionRegistry::new(providers, &Network::evm("base-sepolia", 84_532));
    assert!(r.is_err(), "expected duplicate name error");
}

#[tokio::test]
async fn unknown_action_is_a_failure_not_a_panic() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "nonexistent_action", json!({}), settings(false)).await?;
    assert_eq!(out.code(), Some("unknown_action"));
    assert!(out.render().contains("nonexistent_action"), "{out:?}");
    Ok(())
}

#[tokio::test]
async fn supply_submits_deterministic_calldata() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "supply_weth", json!({ "amount": "0.5 WETH" }), settings(false)).await?;
    assert!(out.is_success(), "supply failed: {out:?}");
    assert!(
        out.render().contains("0x0101010101010101010101010101010101010101010101010101010101010101"),
        "hash missing from message: {}",
        out.render()
    );
    assert!(out.render().contains("Supplied 0.5 WETH"), "{}", out.render());
    assert!(out.render().contains("Confirmed in block 1234"), "{}", out.render());

    let sent = wallet.sent().await;
    let net = base_sepolia();
    assert_eq!(sent, vec![calldata::supply(&net, U256::from(HALF_WETH), MOCK_USER)]);
    assert_eq!(sent.first().map(|t| t.gas_limit), Some(300_000));
    Ok(())
}

#[tokio::test]
async fn repay_all_uses_max_uint() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "repay_all_weth", json!({}), settings(false)).await?;
    assert!(out.is_success(), "repay all failed: {out:?}");

    let sent = wallet.sent().await;
    let tx = sent.first().ok_or_else(|| eyre::eyre!("no tx sent"))?;
    let call = IAavePoolV3::repayCall::abi_decode(&tx.data)?;
    assert_eq!(call.amount, U256::MAX);
    assert_eq!(call.interestRateMode, U256::from(2_u8));
    assert_eq!(call.onBehalfOf, MOCK_USER);
    Ok(())
}

#[tokio::test]
async fn approve_accepts_max() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let args = json!({ "amount": "max" });
    let out = run(&wallet, "approve_weth_for_aave", args, settings(false)).await?;
    assert!(out.render().contains("unlimited"), "{}", out.render());
    let sent = wallet.sent().await;
    let tx = sent.first().ok_or_else(|| eyre::eyre!("no tx sent"))?;
    let call = IERC20::approveCall::abi_decode(&tx.data)?;
    assert_eq!(call.spender, base_sepolia().pool);
    assert_eq!(call.value, U256::MAX);
    assert_eq!(tx.gas_limit, 100_000);
    Ok(())
}

#[tokio::test]
async fn wallet_rejection_is_reported() -> eyre::Result<()> {
    let wallet = MockWallet::new().rejecting_sends("user rejected the request");
    let out = run(&wallet, "borrow_weth", json!({ "amount": "0.1" }), settings(false)).await?;
    assert_eq!(out.code(), Some("wallet_error"));
    assert!(out.render().starts_with("Error borrowing WETH"), "{}", out.render());
    assert!(out.render().contains("user rejected the request"), "{}", out.render());
    Ok(())
}

#[tokio::test]
async fn hanging_wallet_times_out() -> eyre::Result<()> {
    let wallet = MockWallet::new().hanging_sends();
    let s = ActionSettings {
        call_timeout: Duration::from_millis(50),
        ..settings(false)
    };
    let out = run(&wallet, "withdraw_weth", json!({ "amount": "1" }), s).await?;
    assert_eq!(out.code(), Some("timeout"));
    assert!(out.render().contains("timed out"), "{}", out.render());
    Ok(())
}

#[tokio::test]
async fn reverted_receipt_is_a_failure() -> eyre::Result<()> {
    let wallet = MockWallet::new().reverting();
    let out = run(&wallet, "repay_weth", json!({ "amount": "0.2" }), settings(false)).await?;
    assert_eq!(out.code(), Some("tx_reverted"));
    let v = serde_json::to_value(&out)?;
    assert_eq!(v["data"]["tx_hash"], B256::repeat_byte(1).to_string());
    Ok(())
}

#[tokio::test]
async fn unconfirmed_submission_names_the_hash() -> eyre::Result<()> {
    let wallet = MockWallet::new().hanging_confirmations();
    let s = ActionSettings {
        confirmation_timeout: Duration::from_millis(50),
        ..settings(false)
    };
    let out = run(&wallet, "supply_weth", json!({ "amount": "0.5" }), s).await?;
    assert_eq!(out.code(), Some("timeout"));
    assert_eq!(wallet.sent().await.len(), 1, "the supply went out once");

    let hash = B256::repeat_byte(1).to_string();
    let text = out.render();
    assert!(text.starts_with("Error supplying WETH: transaction "), "{text}");
    assert!(text.contains(&hash), "hash missing from {text}");
    assert!(text.contains("before resending"), "{text}");

    let v = serde_json::to_value(&out)?;
    assert_eq!(v["data"]["tx_hash"], hash);
    assert_eq!(v["data"]["submitted"], true);
    Ok(())
}

#[tokio::test]
async fn bad_amounts_never_reach_the_wallet() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    for (args, code) in [
        (json!({ "amount": "abc" }), "invalid_amount"),
        (json!({ "amount": "0" }), "invalid_amount"),
        (json!({ "amount": "-1" }), "invalid_amount"),
        (json!({ "amount": "1.0000000000000000001" }), "invalid_amount"),
        (json!({}), "invalid_request"),
        (json!({ "amount": 1 }), "invalid_request"),
    ] {
        let out = run(&wallet, "supply_weth", args.clone(), settings(false)).await?;
        assert_eq!(out.code(), Some(code), "args={args}: {out:?}");
    }
    assert!(wallet.sent().await.is_empty(), "no transaction should be sent");
    Ok(())
}

#[tokio::test]
async fn preflight_rejects_frozen_reserve() -> eyre::Result<()> {
    let bits = [RESERVE_ACTIVE_BIT, RESERVE_FROZEN_BIT];
    let wallet = with_pool_state(MockWallet::new(), &bits, 0, 0);
    let out = run(&wallet, "supply_weth", json!({ "amount": "0.5" }), settings(true)).await?;
    assert_eq!(out.code(), Some("precondition_failed"), "{out:?}");
    assert!(out.render().contains("frozen"), "{}", out.render());
    assert!(wallet.sent().await.is_empty(), "no transaction should be sent");
    Ok(())
}

#[tokio::test]
async fn preflight_rejects_withdraw_without_deposit_and_repay_without_debt() -> eyre::Result<()> {
    let bits = [RESERVE_ACTIVE_BIT, RESERVE_BORROWING_ENABLED_BIT];
    let wallet = with_pool_state(MockWallet::new(), &bits, 0, 0);

    let out = run(&wallet, "withdraw_weth", json!({ "amount": "0.5" }), settings(true)).await?;
    assert_eq!(out.code(), Some("precondition_failed"), "{out:?}");

    let out = run(&wallet, "repay_all_weth", json!({}), settings(true)).await?;
    assert_eq!(out.code(), Some("precondition_failed"), "{out:?}");
    assert!(out.render().contains("no variable WETH debt"), "{}", out.render());

    let out = run(&wallet, "borrow_weth", json!({ "amount": "0.5" }), settings(true)).await?;
    assert!(out.is_success(), "borrow should pass preflight: {out:?}");
    Ok(())
}

#[tokio::test]
async fn preflight_read_failure_still_submits() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "supply_weth", json!({ "amount": "0.5" }), settings(true)).await?;
    assert!(out.is_success(), "advisory check must not block: {out:?}");
    assert_eq!(wallet.sent().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn balance_reads_are_formatted() -> eyre::Result<()> {
    let net = base_sepolia();
    let wallet = MockWallet::new()
        .with_read(net.weth, IERC20::balanceOfCall::SELECTOR, word(U256::from(HALF_WETH)))
        .with_read(net.weth, IERC20::decimalsCall::SELECTOR, word(U256::from(18_u8)))
        .with_read(net.weth, IERC20::allowanceCall::SELECTOR, word(U256::MAX))
        .with_read(
            net.a_weth,
            IERC20::balanceOfCall::SELECTOR,
            word(U256::from(1_250_000_000_000_000_000_u128)),
        )
        .with_read(net.a_weth, IERC20::decimalsCall::SELECTOR, word(U256::from(18_u8)))
        .with_read(net.variable_debt_weth, IERC20::balanceOfCall::SELECTOR, word(U256::ZERO));

    let out = run(&wallet, "check_weth_balance", json!({}), settings(false)).await?;
    assert_eq!(out.render(), "WETH balance: 0.5 WETH");

    let out = run(&wallet, "check_atoken_balance", json!({}), settings(false)).await?;
    assert!(out.render().starts_with("aWETH balance: 1.25 aWETH"), "{}", out.render());

    let out = run(&wallet, "check_debt_balance", json!({}), settings(false)).await?;
    assert!(out.render().contains("No outstanding"), "{}", out.render());

    let out = run(&wallet, "check_weth_allowance", json!({}), settings(false)).await?;
    assert!(out.render().contains("unlimited"), "{}", out.render());

    let out = run(&wallet, "get_weth_balance", json!({}), settings(false)).await?;
    assert!(out.render().ends_with("0.5 WETH"), "{}", out.render());
    Ok(())
}

#[tokio::test]
async fn failed_read_is_reported() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "check_weth_balance", json!({}), settings(false)).await?;
    assert_eq!(out.code(), Some("rpc_error"));
    assert!(out.render().starts_with("Error checking WETH balance"), "{}", out.render());
    Ok(())
}

#[tokio::test]
async fn account_data_is_rendered() -> eyre::Result<()> {
    let net = base_sepolia();
    let account = (
        U256::from(250_000_000_000_u64), // 2500.00000000
        U256::from(100_000_000_000_u64), // 1000.00000000
        U256::from(87_500_000_000_u64),
        U256::from(8_300_u64),
        U256::from(8_000_u64),
        U256::from(2_075_000_000_000_000_000_u128),
    )
        .abi_encode_params();
    let selector = IAavePoolV3::getUserAccountDataCall::SELECTOR;
    let wallet = MockWallet::new().with_read(net.pool, selector, account);
    let out = run(&wallet, "get_user_account_data", json!({}), settings(false)).await?;
    let text = out.render();
    assert!(text.contains("Total collateral: 2500 (base currency)"), "{text}");
    assert!(text.contains("Loan to value: 80%"), "{text}");
    assert!(text.contains("Liquidation threshold: 83%"), "{text}");
    assert!(text.contains("Health factor: 2.075"), "{text}");
    Ok(())
}

#[tokio::test]
async fn wrap_and_unwrap_weth() -> eyre::Result<()> {
    let wallet = MockWallet::new();
    let out = run(&wallet, "wrap_eth", json!({ "amount": "0.5 eth" }), settings(false)).await?;
    assert!(out.render().starts_with("Wrapped 0.5 ETH into WETH."), "{}", out.render());
    let out = run(&wallet, "unwrap_weth", json!({ "amount": "0.5" }), settings(false)).await?;
    assert!(out.is_success(), "{out:?}");

    let net = base_sepolia();
    let amt = U256::from(HALF_WETH);
    assert_eq!(
        wallet.sent().await,
        vec![calldata::wrap_eth(&net, amt), calldata::unwrap_weth(&net, amt)]
    );
    Ok(())
}

#[test]
fn outcome_serializes_with_status_tag() -> eyre::Result<()> {
    let ok = serde_json::to_value(ActionOutcome::success("done", json!({ "x": 1 })))?;
    assert_eq!(ok, json!({ "status": "success", "message": "done", "data": { "x": 1 } }));
    let bad = serde_json::to_value(ActionOutcome::failure(ToolError::new("timeout", "slow")))?;
    assert_eq!(bad, json!({ "status": "failure", "code": "timeout", "message": "slow" }));
    Ok(())
}
