use crate::query::SearchQuery;
use crate::rest::{AppJson, ErrorResponse, RequestState};
use crate::search::{search, SearchResults};
use crate::AppError;
use axum::extract::{Query, State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Per-collection failures are reported inside the body, so only a storage outage yields an error status.
#[utoipa::path(
    get,
    path = "/api/v1/search",
    params(SearchQuery),
    responses((status = OK, body = SearchResults), (status = INTERNAL_SERVER_ERROR, body = ErrorResponse)),
    tag = "Search"
)]
#[axum::debug_handler]
pub async fn search_all(
    State(state): State<RequestState>,
    Query(query): Query<SearchQuery>,
) -> Result<AppJson<SearchResults>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Ok(AppJson(search(&read_tx, &query.request())))
}

pub fn router() -> OpenApiRouter<RequestState> {
    OpenApiRouter::new().routes(routes!(search_all))
}
