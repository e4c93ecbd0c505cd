//! Shared fixtures for the integration tests
//!
//! A `wiremock` server stands in for Bitcoin Core: it accepts the JSON-RPC
//! POSTs and answers with canned envelopes.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use esplora_rpc_proxy::{create_router, BitcoinRpcClient, ChainQuery, RpcConfig};

pub const RPC_USER: &str = "user";
pub const RPC_PASSWORD: &str = "pass";
/// base64("user:pass")
pub const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";

pub fn rpc_config(url: impl Into<String>) -> RpcConfig {
    RpcConfig {
        url: url.into(),
        user: RPC_USER.to_string(),
        password: RPC_PASSWORD.to_string(),
        timeout: Duration::from_secs(5),
    }
}

pub fn chain_for(url: impl Into<String>, serialize_scans: bool) -> Arc<ChainQuery> {
    let rpc = BitcoinRpcClient::new(&rpc_config(url)).unwrap();
    Arc::new(ChainQuery::new(rpc, serialize_scans))
}

pub fn router_for(node: &MockServer) -> Router {
    create_router(chain_for(node.uri(), false))
}

/// A node URL nothing is listening on
pub fn dead_node_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn rpc_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": result,
        "error": null,
        "id": "esplora-rpc-proxy"
    }))
}

/// What Bitcoin Core sends when a second scan starts while one is running
pub fn scan_in_progress() -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_json(json!({
        "result": null,
        "error": {
            "code": -8,
            "message": "Scan already in progress, use action \"abort\" or \"status\""
        },
        "id": "esplora-rpc-proxy"
    }))
}

pub async fn mount_rpc(node: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(response)
        .mount(node)
        .await;
}

pub async fn mount_scan(node: &MockServer, result: Value) {
    mount_rpc(node, "scantxoutset", rpc_ok(result)).await;
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn send(router: Router, http_method: &str, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(http_method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    send(router, "GET", uri).await
}
