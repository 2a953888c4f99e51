use crate::entity::{cutoff, now_ms};
use crate::merge::address_transactions;
use crate::model::{Address, Block, NetworkStat, Token, TokenTransfer, Transaction, VolumePoint};
use crate::pagination::Page;
use crate::query::{AddressTxQuery, HoursQuery, PageQuery, TokensQuery};
use crate::rest::{AppJson, ErrorResponse, RequestState};
use crate::AppError;
use axum::extract::{Path, Query, State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

#[utoipa::path(
    get,
    path = "/api/v1/block/{number}",
    params(("number" = String, Path, description = "Block number")),
    responses((status = OK, body = Block), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Block"
)]
#[axum::debug_handler]
pub async fn get_block(
    State(state): State<RequestState>,
    Path(number): Path<String>,
) -> Result<AppJson<Block>, AppError> {
    let number = number.trim().parse::<u64>().map_err(|_| not_found("Block"))?;
    let read_tx = state.storage.begin_read()?;
    Block::get(&read_tx, number)?.map(AppJson).ok_or_else(|| not_found("Block"))
}

#[utoipa::path(
    get,
    path = "/api/v1/block/hash/{hash}",
    params(("hash" = String, Path, description = "Block hash")),
    responses((status = OK, body = Block), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Block"
)]
#[axum::debug_handler]
pub async fn get_block_by_hash(
    State(state): State<RequestState>,
    Path(hash): Path<String>,
) -> Result<AppJson<Block>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Block::get_by_hash(&read_tx, &hash)?.map(AppJson).ok_or_else(|| not_found("Block"))
}

#[utoipa::path(
    get,
    path = "/api/v1/blocks",
    params(PageQuery),
    responses((status = OK, body = Page<Block>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Block"
)]
#[axum::debug_handler]
pub async fn latest_blocks(
    State(state): State<RequestState>,
    Query(query): Query<PageQuery>,
) -> Result<AppJson<Page<Block>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Block::latest(&read_tx, &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/block/{number}/txs",
    params(("number" = String, Path, description = "Block number"), PageQuery),
    responses((status = OK, body = Page<Transaction>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Block"
)]
#[axum::debug_handler]
pub async fn block_transactions(
    State(state): State<RequestState>,
    Path(number): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<AppJson<Page<Transaction>>, AppError> {
    let number = number.trim().parse::<u64>().map_err(|_| not_found("Block"))?;
    let read_tx = state.storage.begin_read()?;
    Transaction::by_block(&read_tx, number, &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/tx/{hash}",
    params(("hash" = String, Path, description = "Transaction hash")),
    responses((status = OK, body = Transaction), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Transaction"
)]
#[axum::debug_handler]
pub async fn get_transaction(
    State(state): State<RequestState>,
    Path(hash): Path<String>,
) -> Result<AppJson<Transaction>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Transaction::get_by_hash(&read_tx, &hash)?.map(AppJson).ok_or_else(|| not_found("Transaction"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tx/{hash}/transfers",
    params(("hash" = String, Path, description = "Transaction hash")),
    responses((status = OK, body = Vec<TokenTransfer>)),
    tag = "Transaction"
)]
#[axum::debug_handler]
pub async fn transaction_transfers(
    State(state): State<RequestState>,
    Path(hash): Path<String>,
) -> Result<AppJson<Vec<TokenTransfer>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    TokenTransfer::by_transaction(&read_tx, &hash).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/txs",
    params(PageQuery),
    responses((status = OK, body = Page<Transaction>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Transaction"
)]
#[axum::debug_handler]
pub async fn latest_transactions(
    State(state): State<RequestState>,
    Query(query): Query<PageQuery>,
) -> Result<AppJson<Page<Transaction>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Transaction::latest(&read_tx, &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/address/{address}",
    params(("address" = String, Path, description = "Address")),
    responses((status = OK, body = Address), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Address"
)]
#[axum::debug_handler]
pub async fn get_address(
    State(state): State<RequestState>,
    Path(address): Path<String>,
) -> Result<AppJson<Address>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Address::get(&read_tx, &address)?.map(AppJson).ok_or_else(|| not_found("Address"))
}

#[utoipa::path(
    get,
    path = "/api/v1/address/{address}/txs",
    params(("address" = String, Path, description = "Address"), AddressTxQuery),
    responses((status = OK, body = Page<Transaction>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Address"
)]
#[axum::debug_handler]
pub async fn address_txs(
    State(state): State<RequestState>,
    Path(address): Path<String>,
    Query(query): Query<AddressTxQuery>,
) -> Result<AppJson<Page<Transaction>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    address_transactions(&read_tx, &address, query.filter(), &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/top",
    params(PageQuery),
    responses((status = OK, body = Page<Address>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Address"
)]
#[axum::debug_handler]
pub async fn top_addresses(
    State(state): State<RequestState>,
    Query(query): Query<PageQuery>,
) -> Result<AppJson<Page<Address>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Address::top_by_balance(&read_tx, &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/token/{address}",
    params(("address" = String, Path, description = "Token contract address")),
    responses((status = OK, body = Token), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "Token"
)]
#[axum::debug_handler]
pub async fn get_token(
    State(state): State<RequestState>,
    Path(address): Path<String>,
) -> Result<AppJson<Token>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Token::get(&read_tx, &address)?.map(AppJson).ok_or_else(|| not_found("Token"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tokens",
    params(TokensQuery),
    responses((status = OK, body = Page<Token>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Token"
)]
#[axum::debug_handler]
pub async fn top_tokens(
    State(state): State<RequestState>,
    Query(query): Query<TokensQuery>,
) -> Result<AppJson<Page<Token>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Token::top(&read_tx, query.token_type(), &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/token/{address}/transfers",
    params(("address" = String, Path, description = "Token contract address"), PageQuery),
    responses((status = OK, body = Page<TokenTransfer>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Token"
)]
#[axum::debug_handler]
pub async fn token_transfers(
    State(state): State<RequestState>,
    Path(address): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<AppJson<Page<TokenTransfer>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    TokenTransfer::by_token(&read_tx, &address, &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses((status = OK, body = NetworkStat, description = "Latest stats, null before the first ingestion")),
    tag = "Stats"
)]
#[axum::debug_handler]
pub async fn latest_stats(State(state): State<RequestState>) -> Result<AppJson<Option<NetworkStat>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    NetworkStat::latest(&read_tx).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/history",
    params(HoursQuery),
    responses((status = OK, body = Page<NetworkStat>), (status = BAD_REQUEST, body = ErrorResponse)),
    tag = "Stats"
)]
#[axum::debug_handler]
pub async fn stats_history(
    State(state): State<RequestState>,
    Query(query): Query<HoursQuery>,
) -> Result<AppJson<Page<NetworkStat>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    NetworkStat::history(&read_tx, cutoff(now_ms(), query.hours()), &query.opts()).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/gas-price",
    params(HoursQuery),
    responses((status = OK, body = Vec<NetworkStat>)),
    tag = "Stats"
)]
#[axum::debug_handler]
pub async fn gas_price_history(
    State(state): State<RequestState>,
    Query(query): Query<HoursQuery>,
) -> Result<AppJson<Vec<NetworkStat>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    NetworkStat::gas_price_history(&read_tx, cutoff(now_ms(), query.hours())).map(AppJson)
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/tx-volume",
    params(HoursQuery),
    responses((status = OK, body = Vec<VolumePoint>)),
    tag = "Stats"
)]
#[axum::debug_handler]
pub async fn transaction_volume(
    State(state): State<RequestState>,
    Query(query): Query<HoursQuery>,
) -> Result<AppJson<Vec<VolumePoint>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Block::volume_history(&read_tx, cutoff(now_ms(), query.hours())).map(AppJson)
}

pub fn router() -> OpenApiRouter<RequestState> {
    OpenApiRouter::new()
        .routes(routes!(get_block))
        .routes(routes!(get_block_by_hash))
        .routes(routes!(latest_blocks))
        .routes(routes!(block_transactions))
        .routes(routes!(get_transaction))
        .routes(routes!(transaction_transfers))
        .routes(routes!(latest_transactions))
        .routes(routes!(get_address))
        .routes(routes!(address_txs))
        .routes(routes!(top_addresses))
        .routes(routes!(get_token))
        .routes(routes!(top_tokens))
        .routes(routes!(token_transfers))
        .routes(routes!(latest_stats))
        .routes(routes!(stats_history))
        .routes(routes!(gas_price_history))
        .routes(routes!(transaction_volume))
}
