// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Minimal JSON-RPC 2.0 client over HTTP.
//!
//! Separates "no usable answer" (transport) from "the node answered with an
//! error object" so adapters can tell an unknown submission outcome apart
//! from a rejection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default HTTP timeout per call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: T,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Errors from a single JSON-RPC call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RpcCallError {
    /// Request never produced a readable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Node returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Response body was readable but did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// JSON-RPC invalid params, returned by nodes for malformed keys/addresses.
pub const INVALID_PARAMS: i64 = -32602;

/// HTTP JSON-RPC client bound to one endpoint.
pub struct RpcClient {
    endpoint: url::Url,
    http: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: url::Url) -> Result<Self, RpcCallError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RpcCallError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Issue one call and decode its `result`.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcCallError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcCallError::Transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RpcCallError::Transport(format!("{method} body read failed: {e}")))?;

        // Nodes may pair a 4xx/5xx with a proper error object; prefer the object.
        match decode_response(&body) {
            Err(RpcCallError::InvalidResponse(_)) if !status.is_success() => Err(
                RpcCallError::Transport(format!("{method} returned HTTP {status}")),
            ),
            other => other,
        }
    }
}

/// Decode a JSON-RPC response body.
pub(crate) fn decode_response<R: DeserializeOwned>(body: &[u8]) -> Result<R, RpcCallError> {
    let response: JsonRpcResponse<R> = serde_json::from_slice(body)
        .map_err(|e| RpcCallError::InvalidResponse(format!("malformed JSON-RPC body: {e}")))?;

    if let Some(error) = response.error {
        return Err(RpcCallError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    response
        .result
        .ok_or_else(|| RpcCallError::InvalidResponse("no result in RPC response".to_string()))
}
