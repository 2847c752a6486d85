use super::types::*;
use crate::error::LedgerError;
use crate::ledger::{Commit, Ledger};
use crate::rpc::RpcState;
use axum::{debug_handler, extract::State, Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Main dispatcher: routes incoming JSON-RPC requests to the correct handler.
#[debug_handler]
pub async fn handle_rpc_request(
    State(state): State<RpcState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    debug!("RPC Request: method={}, id={}", req.method, req.id);

    // Ledger calls take std locks and may fsync; keep them off the async workers
    let ledger = state.ledger.clone();
    let method = req.method.clone();
    let params = req.params;
    let result = tokio::task::spawn_blocking(move || dispatch(&ledger, &method, params))
        .await
        .unwrap_or_else(|e| Err(LedgerError::Internal(format!("handler task failed: {}", e)).into()));

    // Build response
    match result {
        Ok(val) => Json(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(val),
            error: None,
            id: req.id,
        }),
        Err(err) => {
            debug!("RPC Error: method={}, code={}, {}", req.method, err.code, err.message);
            Json(RpcResponse {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(err),
                id: req.id,
            })
        }
    }
}

fn dispatch(ledger: &Ledger, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    match method {
        "getStatus" => handle_get_status(ledger),
        "getBalance" => handle_get_balance(ledger, params),
        "mine" => handle_mine(ledger, params),
        "registerAlias" => handle_register_alias(ledger, params),
        "transfer" => handle_transfer(ledger, params),
        _ => Err(RpcError::method_not_found(method)),
    }
}

//
// === Helper Functions for Safe Operations ===
//
fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(RpcError::invalid_params)
}

/// Safely serialize to JSON value
fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: -32603,
        message: format!("Serialization error: {}", e),
    })
}

/// Serialize a commit's value and flag whether it reached storage
fn commit_to_json<T: Serialize>(commit: Commit<T>) -> Result<serde_json::Value, RpcError> {
    let durable = commit.is_durable();
    let mut value = to_json(&commit.value)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("durable".to_string(), serde_json::Value::Bool(durable));
    }
    Ok(value)
}

/// Handle getStatus
fn handle_get_status(ledger: &Ledger) -> Result<serde_json::Value, RpcError> {
    to_json(&ledger.status()?)
}

/// Handle getBalance (registers unseen wallets)
fn handle_get_balance(ledger: &Ledger, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let p: GetBalanceParams = parse_params(params)?;
    let commit = ledger.get_balance(&p.wallet_id)?;

    let mut value = commit_to_json(commit)?;
    if value.get("alias").is_some_and(|a| a.is_null()) {
        value["alias"] = serde_json::Value::String(UNKNOWN_ALIAS.to_string());
    }
    Ok(value)
}

/// Handle mine
fn handle_mine(ledger: &Ledger, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let p: MineParams = parse_params(params)?;
    commit_to_json(ledger.mine(&p.wallet_id, p.reward)?)
}

/// Handle registerAlias
fn handle_register_alias(ledger: &Ledger, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let p: RegisterAliasParams = parse_params(params)?;
    commit_to_json(ledger.register_alias(&p.wallet_id, &p.username)?)
}

/// Handle transfer
fn handle_transfer(ledger: &Ledger, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let p: TransferParams = parse_params(params)?;
    commit_to_json(ledger.transfer(&p.sender, &p.destination, p.amount)?)
}
