// RPC types for JSON-RPC 2.0 protocol
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Rendered in place of an alias for wallets that have none
pub const UNKNOWN_ALIAS: &str = "unknown";

#[derive(Deserialize, Debug)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Serialize, Debug)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn invalid_params(e: impl std::fmt::Display) -> Self {
        Self {
            code: -32602,
            message: format!("Invalid params: {}", e),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
        }
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        let code = match &err {
            LedgerError::InvalidAmount => -32001,
            LedgerError::InsufficientFunds => -32002,
            LedgerError::AliasNotFound(_) => -32003,
            LedgerError::AliasTaken(_) => -32004,
            LedgerError::InvalidAlias(_) => -32005,
            LedgerError::BalanceOverflow(_) => -32006,
            LedgerError::PersistenceFailure(_) => -32010,
            LedgerError::Internal(_) => -32603,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

// Method-specific parameter types
#[derive(Deserialize, Debug)]
pub struct GetBalanceParams {
    pub wallet_id: String,
}

#[derive(Deserialize, Debug)]
pub struct MineParams {
    pub wallet_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub reward: Decimal,
}

#[derive(Deserialize, Debug)]
pub struct RegisterAliasParams {
    pub wallet_id: String,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct TransferParams {
    pub sender: String,
    pub destination: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}
