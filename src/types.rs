/// Esplora API response types
///
/// These match the Esplora JSON shapes so existing clients can consume them
/// unchanged.

use serde::Serialize;

use crate::chain::{AddressBalance, Utxo};

/// UTXO entry from /address/{address}/utxo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoResponse {
    pub txid: String,
    pub vout: u32,
    pub value: i64,
    pub status: UtxoStatus,
}

/// `block_height` is serialized as `null` for unconfirmed outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoStatus {
    pub confirmed: bool,
    pub block_height: Option<u64>,
}

/// Address stats from /address/{address}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressStatsResponse {
    pub chain_stats: FundedStats,
    pub mempool_stats: FundedStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundedStats {
    pub funded_txo_sum: u64,
}

impl From<Utxo> for UtxoResponse {
    fn from(utxo: Utxo) -> Self {
        Self {
            txid: utxo.txid,
            vout: utxo.vout,
            value: utxo.value,
            status: UtxoStatus {
                confirmed: utxo.confirmed,
                block_height: utxo.block_height,
            },
        }
    }
}

impl From<AddressBalance> for AddressStatsResponse {
    fn from(balance: AddressBalance) -> Self {
        Self {
            chain_stats: FundedStats {
                funded_txo_sum: balance.confirmed_funded,
            },
            mempool_stats: FundedStats {
                funded_txo_sum: balance.mempool_funded,
            },
        }
    }
}
