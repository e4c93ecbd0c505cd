//! Chain queries answered from Bitcoin Core
//!
//! The node is assumed to have no address index, so address lookups go
//! through `scantxoutset`, which walks the whole UTXO set filtered by an
//! `addr(...)` descriptor. That is slow and Bitcoin Core only runs one scan
//! at a time; a concurrent scan fails with "Scan already in progress", which
//! is passed back to the caller as an ordinary [`RpcError`]. With
//! `serialize_scans` enabled, scans issued through one [`ChainQuery`] queue on
//! an async mutex instead.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::config::ProxyConfig;
use crate::error::RpcError;
use crate::rpc_client::BitcoinRpcClient;

/// Satoshis per BTC
const SATS_PER_BTC: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// One unspent output belonging to an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Value in satoshis, not clamped
    pub value: i64,
    pub confirmed: bool,
    /// Only set when confirmed
    pub block_height: Option<u64>,
}

/// Funded totals for an address
///
/// Mempool state is never queried, so `mempool_funded` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressBalance {
    pub confirmed_funded: u64,
    pub mempool_funded: u64,
}

/// `scantxoutset start` result, reduced to the fields we read
#[derive(Debug, Default, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "btc_amount")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unspents: Vec<ScanUnspent>,
}

#[derive(Debug, Deserialize)]
pub struct ScanUnspent {
    pub txid: String,
    pub vout: u32,
    #[serde(default, deserialize_with = "btc_amount")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub height: i64,
}

/// Convert a BTC amount to satoshis, truncating toward zero
///
/// Fails only if the result does not fit in an `i64`.
pub fn btc_to_sats(amount: Decimal) -> Result<i64, RpcError> {
    amount
        .checked_mul(SATS_PER_BTC)
        .map(|sats| sats.trunc())
        .and_then(|sats| sats.to_i64())
        .ok_or_else(|| RpcError::decode(format!("amount out of range: {}", amount)))
}

/// Parse a BTC amount given as a JSON number or a decimal string
pub fn parse_btc_amount(value: &Value) -> Result<Decimal, String> {
    match value {
        Value::Null => Ok(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s.trim()).map_err(|e| format!("'{}': {}", s, e)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else {
                // f64 Display is the shortest round-trip text and never uses
                // exponent notation, so 1e-8 reads back as exactly 0.00000001
                let f = n.as_f64().ok_or_else(|| format!("'{}' is not finite", n))?;
                Decimal::from_str(&f.to_string()).map_err(|e| format!("'{}': {}", n, e))
            }
        }
        other => Err(format!("expected a number, got {}", other)),
    }
}

fn btc_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_btc_amount(&value).map_err(serde::de::Error::custom)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Decode a `getblockcount` result
pub fn decode_tip_height(result: Value) -> Result<u64, RpcError> {
    serde_json::from_value(result)
        .map_err(|e| RpcError::decode(format!("invalid getblockcount result: {}", e)))
}

/// Decode a `scantxoutset` result; a null result reads as an empty scan
pub fn decode_scan_result(result: Value) -> Result<ScanResult, RpcError> {
    if result.is_null() {
        return Ok(ScanResult::default());
    }
    let scan: ScanResult = serde_json::from_value(result)
        .map_err(|e| RpcError::decode(format!("invalid scantxoutset result: {}", e)))?;
    if scan.success == Some(false) {
        return Err(RpcError::decode("scantxoutset did not complete"));
    }
    Ok(scan)
}

/// Confirmed balance from a scan, floored at zero
pub fn balance_from_scan(scan: &ScanResult) -> Result<AddressBalance, RpcError> {
    let sats = btc_to_sats(scan.total_amount)?;
    Ok(AddressBalance {
        confirmed_funded: u64::try_from(sats).unwrap_or(0),
        mempool_funded: 0,
    })
}

/// UTXO records from a scan; height 0 means unconfirmed
pub fn utxos_from_scan(scan: ScanResult) -> Result<Vec<Utxo>, RpcError> {
    scan.unspents
        .into_iter()
        .map(|unspent| {
            let value = btc_to_sats(unspent.amount)?;
            let block_height = u64::try_from(unspent.height).ok().filter(|h| *h > 0);
            Ok(Utxo {
                txid: unspent.txid,
                vout: unspent.vout,
                value,
                confirmed: block_height.is_some(),
                block_height,
            })
        })
        .collect()
}

fn address_descriptor(address: &str) -> String {
    format!("addr({})", address)
}

pub struct ChainQuery {
    rpc: BitcoinRpcClient,
    scan_queue: Option<Mutex<()>>,
}

impl ChainQuery {
    pub fn new(rpc: BitcoinRpcClient, serialize_scans: bool) -> Self {
        Self {
            rpc,
            scan_queue: serialize_scans.then(|| Mutex::new(())),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, RpcError> {
        let rpc = BitcoinRpcClient::new(&config.rpc)?;
        Ok(Self::new(rpc, config.serialize_scans))
    }

    pub fn rpc(&self) -> &BitcoinRpcClient {
        &self.rpc
    }

    /// Current chain tip height
    pub async fn tip_height(&self) -> Result<u64, RpcError> {
        let result = self.rpc.call("getblockcount", &[]).await?;
        decode_tip_height(result)
    }

    /// Confirmed funded sum for an address
    pub async fn confirmed_balance(&self, address: &str) -> Result<AddressBalance, RpcError> {
        let scan = self.scan_address(address).await?;
        balance_from_scan(&scan)
    }

    /// Unspent outputs for an address
    pub async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, RpcError> {
        let scan = self.scan_address(address).await?;
        utxos_from_scan(scan)
    }

    async fn scan_address(&self, address: &str) -> Result<ScanResult, RpcError> {
        let params = [json!("start"), json!([address_descriptor(address)])];

        let _turn = match &self.scan_queue {
            Some(queue) => Some(queue.lock().await),
            None => None,
        };

        let result = self.rpc.call("scantxoutset", &params).await?;
        decode_scan_result(result)
    }
}
