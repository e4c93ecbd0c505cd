/// Axum HTTP handlers for the Esplora endpoints

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::chain::ChainQuery;
use crate::error::RpcError;
use crate::types::*;

/// Shared application state
pub type AppState = Arc<ChainQuery>;

/// Handler error, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RpcError> for ApiError {
    fn from(err: RpcError) -> Self {
        if err.is_retryable() {
            log::warn!("Node query failed (client may retry): {}", err);
        } else {
            log::error!("Node query failed: {}", err);
        }
        ApiError::Internal(err.to_string())
    }
}

/// Decoded, trimmed address from the path; empty is a client error
fn address_from_path(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    let Path(raw) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let address = raw.trim();
    if address.is_empty() {
        return Err(ApiError::BadRequest("missing address".to_string()));
    }
    Ok(address.to_string())
}

/// GET /blocks/tip/height
/// Returns the current blockchain height as plain text
pub async fn get_tip_height(State(chain): State<AppState>) -> Result<Response, ApiError> {
    let height = chain.tip_height().await?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], height.to_string()).into_response())
}

/// GET /address/{address}/utxo
/// Returns all UTXOs for an address
pub async fn get_address_utxos(
    State(chain): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<UtxoResponse>>, ApiError> {
    let address = address_from_path(path)?;
    let utxos = chain.utxos(&address).await?;
    log::debug!("{} utxos for {}", utxos.len(), address);
    Ok(Json(utxos.into_iter().map(UtxoResponse::from).collect()))
}

/// GET /address/{address}
/// Returns confirmed funded totals for an address
pub async fn get_address_stats(
    State(chain): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AddressStatsResponse>, ApiError> {
    let address = address_from_path(path)?;
    let balance = chain.confirmed_balance(&address).await?;
    Ok(Json(AddressStatsResponse::from(balance)))
}

/// Wrong method on a known path
pub async fn method_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("not found: {}", uri.path()))
}

/// Anything the router did not match
///
/// `/address//utxo` and `/address/` have an empty address segment, which the
/// path matcher won't bind to a parameter; those are still client errors.
pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    if method == Method::GET && has_empty_address_segment(uri.path()) {
        return ApiError::BadRequest("missing address".to_string());
    }
    ApiError::NotFound(format!("not found: {}", uri.path()))
}

fn has_empty_address_segment(path: &str) -> bool {
    match path.strip_prefix("/address/") {
        Some(rest) => rest.strip_suffix("/utxo").unwrap_or(rest).trim().is_empty(),
        None => false,
    }
}
