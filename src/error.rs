//! Error types for the node side of the proxy
//!
//! Every failure talking to Bitcoin Core collapses into [`RpcError`]. The REST
//! layer turns any of these into a 500 carrying the error's message, so the
//! messages keep whatever the node said verbatim.

use serde_json::Value;
use thiserror::Error;

/// Message fragment Bitcoin Core uses when `scantxoutset start` is called
/// while another scan is still running.
const SCAN_IN_PROGRESS: &str = "Scan already in progress";

#[derive(Error, Debug)]
pub enum RpcError {
    /// Node unreachable, connection reset, or the call deadline elapsed
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// Node answered with a non-2xx status
    #[error("rpc http {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON-RPC envelope carried a non-null `error`
    #[error("rpc error: {0}")]
    Node(Value),

    /// Node answered, but not with something we can read
    #[error("rpc decode error: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// True when the node rejected a scan because another one is running.
    ///
    /// Bitcoin Core reports RPC errors with HTTP 500 and the envelope in the
    /// body, so both the `Http` and `Node` shapes are checked.
    pub fn is_scan_in_progress(&self) -> bool {
        match self {
            Self::Http { body, .. } => body.contains(SCAN_IN_PROGRESS),
            Self::Node(err) => err.to_string().contains(SCAN_IN_PROGRESS),
            _ => false,
        }
    }

    /// Errors a client may reasonably retry: contention and timeouts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_)) || self.is_scan_in_progress()
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
