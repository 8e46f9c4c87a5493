use crate::actions::{ActionContext, ActionRegistry};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, BufReader};
use tracing::{debug, warn};

mod jsonrpc;
mod transport;

use jsonrpc::{
    err, ok, tool_result, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};

/// Lines longer than this end the session.
pub const MAX_JSONRPC_LINE_BYTES: usize = 1024 * 1024;

const PROTOCOL_VERSION: &str = "2025-06-18";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ToolCallParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn list_tools_result(registry: &ActionRegistry) -> Value {
    let tools: Vec<Value> = registry.list().iter().map(|a| a.to_json()).collect();
    json!({ "tools": tools })
}

fn initialize_result() -> Value {
    json!({
      "protocolVersion": PROTOCOL_VERSION,
      "serverInfo": { "name": "aavekit", "version": env!("CARGO_PKG_VERSION") },
      "capabilities": { "tools": {} }
    })
}

async fn handle(
    req: JsonRpcRequest,
    registry: &ActionRegistry,
    ctx: &ActionContext<'_>,
) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => ok(req.id, initialize_result()),
        "ping" => ok(req.id, json!({})),
        "tools/list" => ok(req.id, list_tools_result(registry)),
        "tools/call" => match serde_json::from_value::<ToolCallParams>(req.params) {
            Ok(p) if !p.name.is_empty() => {
                let outcome = registry.invoke(&p.name, p.arguments, ctx).await;
                ok(req.id, tool_result(&outcome))
            }
            Ok(_) => err(req.id, INVALID_PARAMS, "missing tool name"),
            Err(e) => err(req.id, INVALID_PARAMS, format!("invalid tools/call params: {e}")),
        },
        _ => err(req.id, METHOD_NOT_FOUND, "method not found"),
    }
}

/// Serve newline-delimited JSON-RPC until `input` closes.
pub async fn serve<R, W>(
    input: R,
    out: &mut W,
    registry: &ActionRegistry,
    ctx: &ActionContext<'_>,
) -> eyre::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.len() > MAX_JSONRPC_LINE_BYTES {
            warn!(len = line.len(), "oversized jsonrpc line, closing session");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let v: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "invalid json on stdin");
                continue;
            }
        };

        // Notifications carry no id and get no reply.
        if v.get("id").is_none() {
            debug!(method = ?v.get("method"), "notification");
            continue;
        }

        let req: JsonRpcRequest = match serde_json::from_value(v) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "failed to parse jsonrpc request");
                continue;
            }
        };
        if req.jsonrpc != "2.0" {
            let resp = err(req.id, INVALID_REQUEST, "invalid jsonrpc version");
            transport::write_frame(out, &resp).await?;
            continue;
        }

        let resp = handle(req, registry, ctx).await;
        transport::write_frame(out, &resp).await?;
    }
    Ok(())
}

pub async fn run(registry: &ActionRegistry, ctx: &ActionContext<'_>) -> eyre::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    serve(stdin, &mut stdout, registry, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::{default_providers, ActionSettings},
        contracts::IERC20,
        networks::{base_sepolia, NetworkTable},
        wallet::{mock::MockWallet, WalletProvider as _},
    };
    use alloy::{
        primitives::U256,
        sol_types::{SolCall as _, SolValue as _},
    };

    async fn session(wallet: &MockWallet, input: &str) -> eyre::Result<Vec<Value>> {
        let networks = NetworkTable::builtin();
        let registry = ActionRegistry::new(default_providers(), &wallet.network())?;
        let ctx = ActionContext::new(wallet, &networks, ActionSettings::default());
        let mut out = Vec::new();
        serve(input.as_bytes(), &mut out, &registry, &ctx).await?;
        String::from_utf8(out)?
            .lines()
            .map(|l| serde_json::from_str(l).map_err(eyre::Report::from))
            .collect()
    }

    #[tokio::test]
    async fn handshake_and_listing() -> eyre::Result<()> {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n",
        );
        let frames = session(&MockWallet::new(), input).await?;
        assert_eq!(frames.len(), 3, "notification gets no reply: {frames:?}");

        assert_eq!(frames[0]["result"]["serverInfo"]["name"], "aavekit");
        let tools = frames[1]["result"]["tools"]
            .as_array()
            .ok_or_else(|| eyre::eyre!("tools array"))?;
        assert_eq!(tools.len(), 14);
        assert_eq!(tools[0]["name"], "check_weth_balance");
        let supply = tools
            .iter()
            .find(|t| t["name"] == "supply_weth")
            .ok_or_else(|| eyre::eyre!("supply_weth listed"))?;
        assert_eq!(supply["inputSchema"]["required"], json!(["amount"]));
        assert_eq!(frames[2]["id"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn tool_call_returns_rendered_text() -> eyre::Result<()> {
        let net = base_sepolia();
        let wallet = MockWallet::new()
            .with_read(
                net.weth,
                IERC20::balanceOfCall::SELECTOR,
                U256::from(10_u64.pow(18)).abi_encode(),
            )
            .with_read(net.weth, IERC20::decimalsCall::SELECTOR, U256::from(18_u8).abi_encode());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"check_weth_balance","arguments":{}}}"#,
            "\n"
        );
        let frames = session(&wallet, input).await?;
        let result = &frames[0]["result"];
        assert_eq!(result["isError"], false);
        let text = result["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.contains("1 WETH"), "{text}");
        assert_eq!(result["structuredContent"]["status"], "success");
        Ok(())
    }

    #[tokio::test]
    async fn failures_are_tool_errors_not_rpc_errors() -> eyre::Result<()> {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"supply_weth","arguments":{"amount":"-1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"no_such_tool"}}"#,
            "\n",
        );
        let frames = session(&MockWallet::new(), input).await?;
        assert_eq!(frames[0]["result"]["isError"], true);
        assert_eq!(frames[0]["result"]["structuredContent"]["code"], "invalid_amount");
        assert_eq!(frames[1]["result"]["structuredContent"]["code"], "unknown_action");
        Ok(())
    }

    #[tokio::test]
    async fn protocol_errors() -> eyre::Result<()> {
        let input = concat!(
            "not json\n",
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#,
            "\n",
        );
        let frames = session(&MockWallet::new(), input).await?;
        let codes: Vec<i64> = frames
            .iter()
            .filter_map(|f| f["error"]["code"].as_i64())
            .collect();
        assert_eq!(codes, vec![INVALID_REQUEST, METHOD_NOT_FOUND, INVALID_PARAMS]);
        Ok(())
    }
}
