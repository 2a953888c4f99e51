//! Ingestion endpoints for the upstream indexer. Payloads are already shaped as stored records.

use crate::ingest;
use crate::model::{Address, Block, NetworkStat, Token, TokenTransfer, Transaction};
use crate::rest::{AppJson, ErrorResponse, RequestState};
use crate::{info, AppError};
use axum::extract::State;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
}

impl WebhookAck {
    fn ok() -> AppJson<WebhookAck> {
        AppJson(WebhookAck { success: true })
    }
}

fn authorize(state: &RequestState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Ok(());
    };
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(secret) {
        Ok(())
    } else {
        Err(AppError::Unauthenticated("Invalid webhook secret".to_string()))
    }
}

#[utoipa::path(
    post,
    path = "/webhook/block",
    request_body = Block,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_block(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(block): AppJson<Block>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    ingest::insert_block(&state.storage, &block)?;
    info!("Webhook stored block {}", block.number);
    Ok(WebhookAck::ok())
}

#[utoipa::path(
    post,
    path = "/webhook/transaction",
    request_body = Transaction,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_transaction(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(transaction): AppJson<Transaction>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    ingest::insert_transaction(&state.storage, &transaction)?;
    info!("Webhook stored transaction {}", transaction.hash);
    Ok(WebhookAck::ok())
}

#[utoipa::path(
    post,
    path = "/webhook/address",
    request_body = Address,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_address(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(address): AppJson<Address>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    let stored = ingest::upsert_address(&state.storage, &address)?;
    info!("Webhook upserted address {}", stored.address);
    Ok(WebhookAck::ok())
}

#[utoipa::path(
    post,
    path = "/webhook/stats",
    request_body = NetworkStat,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_stats(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(stat): AppJson<NetworkStat>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    ingest::insert_network_stat(&state.storage, &stat)?;
    info!("Webhook stored network stats at block {}", stat.block_number);
    Ok(WebhookAck::ok())
}

#[utoipa::path(
    post,
    path = "/webhook/token",
    request_body = Token,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_token(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(token): AppJson<Token>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    ingest::insert_token(&state.storage, &token)?;
    info!("Webhook stored token {}", token.address);
    Ok(WebhookAck::ok())
}

#[utoipa::path(
    post,
    path = "/webhook/token-transfer",
    request_body = TokenTransfer,
    responses((status = OK, body = WebhookAck), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "Webhook"
)]
#[axum::debug_handler]
pub async fn ingest_token_transfer(
    State(state): State<RequestState>,
    headers: HeaderMap,
    AppJson(transfer): AppJson<TokenTransfer>,
) -> Result<AppJson<WebhookAck>, AppError> {
    authorize(&state, &headers)?;
    ingest::insert_token_transfer(&state.storage, &transfer)?;
    info!("Webhook stored token transfer {}#{}", transfer.transaction_hash, transfer.log_index);
    Ok(WebhookAck::ok())
}

pub fn router() -> OpenApiRouter<RequestState> {
    OpenApiRouter::new()
        .routes(routes!(ingest_block))
        .routes(routes!(ingest_transaction))
        .routes(routes!(ingest_address))
        .routes(routes!(ingest_stats))
        .routes(routes!(ingest_token))
        .routes(routes!(ingest_token_transfer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use http::HeaderValue;

    fn state(secret: Option<&str>) -> RequestState {
        let storage = Storage::temp("webhook_authorize", 8, true).expect("Failed to create storage");
        RequestState::new(storage, secret.map(str::to_string))
    }

    #[test]
    fn open_webhook_accepts_any_caller() {
        assert!(authorize(&state(None), &HeaderMap::new()).is_ok());
    }

    #[test]
    fn configured_secret_must_match() {
        let state = state(Some("s3cret"));
        let mut headers = HeaderMap::new();
        assert_eq!(authorize(&state, &headers).expect_err("Missing secret").status_code().as_u16(), 401);
        headers.insert(SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(authorize(&state, &headers).is_err());
        headers.insert(SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(authorize(&state, &headers).is_ok());
    }
}
