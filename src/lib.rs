/// Esplora RPC Proxy Library
///
/// Serves a subset of the Esplora REST API (tip height, address stats,
/// address UTXOs) by translating each request into Bitcoin Core JSON-RPC
/// calls. Available as a standalone binary or as library components.

pub mod chain;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rpc_client;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use chain::{AddressBalance, ChainQuery, Utxo};
pub use config::{ProxyConfig, RpcConfig};
pub use error::RpcError;
pub use rpc_client::BitcoinRpcClient;
pub use server::{create_router, run_server};
pub use types::*;
