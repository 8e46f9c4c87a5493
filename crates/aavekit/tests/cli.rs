use assert_cmd::Command;
use eyre::Context as _;
use predicates::prelude::*;
use tempfile::TempDir;

const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

struct Sandbox {
    config: TempDir,
    data: TempDir,
}

impl Sandbox {
    fn new() -> eyre::Result<Self> {
        Ok(Self {
            config: tempfile::tempdir()?,
            data: tempfile::tempdir()?,
        })
    }

    fn cmd(&self) -> Command {
        let mut c = Command::new(assert_cmd::cargo::cargo_bin!("aavekit"));
        c.env("AAVEKIT_CONFIG_DIR", self.config.path())
            .env("AAVEKIT_DATA_DIR", self.data.path())
            .env_remove("AAVEKIT_PRIVATE_KEY")
            .env_remove("AAVEKIT_NETWORK_ID")
            .env_remove("AAVEKIT_RPC_URL")
            .env_remove("RUST_LOG");
        c
    }
}

#[test]
fn actions_json_lists_tool_definitions() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    let out = sb.cmd().args(["actions", "--json"]).output().context("run actions")?;
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let tools: Vec<serde_json::Value> =
        serde_json::from_slice(&out.stdout).context("parse actions json")?;
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names.len(), 14);
    for expected in ["supply_weth", "repay_all_weth", "wrap_eth", "get_user_account_data"] {
        assert!(names.contains(&expected), "missing {expected}: {names:?}");
    }

    // First run writes a default config.
    assert!(sb.config.path().join("config.toml").exists());
    Ok(())
}

#[test]
fn actions_table_is_human_readable() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    sb.cmd()
        .arg("actions")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("approve_weth_for_aave")
                .and(predicate::str::contains("unwrap_weth")),
        );
    Ok(())
}

#[test]
fn paths_reports_overridden_dirs() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    let out = sb.cmd().arg("paths").output().context("run paths")?;
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    let log_file = v["log_file"].as_str().unwrap_or_default();
    assert!(log_file.ends_with("aavekit.log.jsonl"), "{log_file}");
    assert_eq!(
        v["config_dir"].as_str(),
        sb.config.path().to_str(),
        "config dir should follow AAVEKIT_CONFIG_DIR"
    );
    Ok(())
}

#[test]
fn invoke_without_private_key_fails_with_hint() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    sb.cmd()
        .args(["invoke", "check_weth_balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AAVEKIT_PRIVATE_KEY"));
    Ok(())
}

#[test]
fn invoke_rejects_malformed_args() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    sb.cmd()
        .args(["invoke", "supply_weth", "--args", "{amount"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--args must be valid JSON"));
    Ok(())
}

#[test]
fn invoke_reports_action_failure_as_text() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    // Nothing listens on the discard port, so the balance read fails fast.
    sb.cmd()
        .env("AAVEKIT_PRIVATE_KEY", TEST_KEY)
        .env("AAVEKIT_RPC_URL", "http://127.0.0.1:9")
        .args(["invoke", "check_weth_balance"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error checking WETH balance"));
    Ok(())
}

#[test]
fn invoke_validates_amount_before_touching_the_chain() -> eyre::Result<()> {
    let sb = Sandbox::new()?;
    sb.cmd()
        .env("AAVEKIT_PRIVATE_KEY", TEST_KEY)
        .env("AAVEKIT_RPC_URL", "http://127.0.0.1:9")
        .args(["invoke", "supply_weth", "--json", "--args", r#"{"amount":"0"}"#])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"invalid_amount\""));
    Ok(())
}
