/// Proxy configuration from environment variables
///
/// Read once at start-up and handed to the constructors by reference; nothing
/// in the request path looks at the environment again.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:18443";
const DEFAULT_RPC_USER: &str = "chaintx";
const DEFAULT_RPC_PASSWORD: &str = "chaintx";
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 3999;

/// Connection settings for the Bitcoin Core JSON-RPC endpoint
#[derive(Clone, Debug)]
pub struct RpcConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// Deadline applied to every single call
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub rpc: RpcConfig,
    pub server_host: String,
    pub server_port: u16,
    /// Queue scan-triggering requests so only one `scantxoutset` runs at a time
    pub serialize_scans: bool,
}

impl ProxyConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BTC_RPC_URL`: node JSON-RPC endpoint (default `http://127.0.0.1:18443`)
    /// - `BTC_RPC_USER` / `BTC_RPC_PASSWORD`: Basic auth credentials
    /// - `BTC_RPC_TIMEOUT_SECS`: per-call deadline in seconds (default 5)
    /// - `BTC_ESPLORA_PROXY_HOST`: listen host (default `127.0.0.1`)
    /// - `BTC_ESPLORA_PROXY_PORT`: listen port (default 3999)
    /// - `BTC_ESPLORA_PROXY_SERIALIZE_SCANS`: `true` to queue scans (default off)
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timeout_secs: u64 = match lookup("BTC_RPC_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid BTC_RPC_TIMEOUT_SECS: {}", raw))?,
            None => DEFAULT_RPC_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("BTC_RPC_TIMEOUT_SECS must be at least 1");
        }

        let server_port: u16 = match lookup("BTC_ESPLORA_PROXY_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid BTC_ESPLORA_PROXY_PORT: {}", raw))?,
            None => DEFAULT_SERVER_PORT,
        };

        let serialize_scans = match lookup("BTC_ESPLORA_PROXY_SERIALIZE_SCANS") {
            Some(raw) => parse_flag(&raw).with_context(|| {
                format!("Invalid BTC_ESPLORA_PROXY_SERIALIZE_SCANS: {}", raw)
            })?,
            None => false,
        };

        Ok(Self {
            rpc: RpcConfig {
                url: var("BTC_RPC_URL", DEFAULT_RPC_URL),
                user: var("BTC_RPC_USER", DEFAULT_RPC_USER),
                password: var("BTC_RPC_PASSWORD", DEFAULT_RPC_PASSWORD),
                timeout: Duration::from_secs(timeout_secs),
            },
            server_host: var("BTC_ESPLORA_PROXY_HOST", DEFAULT_SERVER_HOST),
            server_port,
            serialize_scans,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: DEFAULT_RPC_URL.to_string(),
                user: DEFAULT_RPC_USER.to_string(),
                password: DEFAULT_RPC_PASSWORD.to_string(),
                timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            },
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            serialize_scans: false,
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}
