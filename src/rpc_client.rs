/// Bitcoin Core JSON-RPC client
///
/// One POST per call, JSON-RPC 1.0 envelope, HTTP Basic auth and a fixed
/// per-call deadline so a stalled node can't hang a request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RpcConfig;
use crate::error::RpcError;

const JSONRPC_VERSION: &str = "1.0";
const REQUEST_ID: &str = "esplora-rpc-proxy";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

pub struct BitcoinRpcClient {
    http: reqwest::Client,
    url: String,
    user: String,
    password: String,
}

impl BitcoinRpcClient {
    /// Create a client for the configured node
    ///
    /// Does not contact the node; connectivity problems show up on the first
    /// call instead of blocking start-up.
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a single JSON-RPC call and return its `result`
    ///
    /// A null or missing `result` comes back as `Value::Null`; callers decode
    /// it into whatever shape they expect.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method,
            params,
        };

        log::debug!("rpc -> {} {}", method, Value::from(params.to_vec()));

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::warn!("rpc {} transport failure: {}", method, e);
                RpcError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            log::warn!("rpc {} returned http {}: {}", method, status.as_u16(), body.trim());
            return Err(RpcError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse = response.json().await.map_err(|e| {
            RpcError::decode(format!("invalid json-rpc envelope for {}: {}", method, e))
        })?;

        match envelope.error {
            Some(err) if !err.is_null() => {
                log::warn!("rpc {} returned error: {}", method, err);
                Err(RpcError::Node(err))
            }
            _ => Ok(envelope.result.unwrap_or(Value::Null)),
        }
    }
}
