use crate::query::AnnotationQuery;
use crate::rest::{AppJson, ErrorResponse, RequestState};
use crate::user::alert::{Alert, NewAlert};
use crate::user::annotation::{Annotation, NewAnnotation};
use crate::user::api_key::{ApiKey, NewApiKey};
use crate::user::watchlist::{NewWatchlist, Watchlist, WatchlistPatch};
use crate::user::{Identity, Owned};
use crate::AppError;
use axum::extract::{FromRequestParts, Path, Query, State};
use http::request::Parts;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub const USER_HEADER: &str = "x-user-id";

/// Caller resolved from the header the authentication proxy sets; absent for anonymous requests.
pub struct CallerIdentity(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Identity::new);
        Ok(CallerIdentity(identity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleBody {
    pub active: bool,
}

/// Authentication is checked before the id so anonymous callers always get 401.
fn record_id<T: Owned>(identity: Option<&Identity>, raw: &str) -> Result<u64, AppError> {
    Identity::require(identity)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::NotFound(format!("{} not found or access denied", T::KIND)))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/watchlists",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    responses((status = OK, body = Vec<Watchlist>)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn list_watchlists(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<AppJson<Vec<Watchlist>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Watchlist::list(&read_tx, identity.as_ref()).map(AppJson)
}

#[utoipa::path(
    post,
    path = "/api/v1/me/watchlists",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = NewWatchlist,
    responses((status = OK, body = Watchlist), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn create_watchlist(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    AppJson(new): AppJson<NewWatchlist>,
) -> Result<AppJson<Watchlist>, AppError> {
    let write_tx = state.storage.begin_write()?;
    let watchlist = Watchlist::create(&write_tx, identity.as_ref(), new)?;
    write_tx.commit()?;
    Ok(AppJson(watchlist))
}

#[utoipa::path(
    patch,
    path = "/api/v1/me/watchlists/{id}",
    params(("id" = String, Path, description = "Watchlist id"), ("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = WatchlistPatch,
    responses((status = OK, body = Watchlist), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn update_watchlist(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
    AppJson(patch): AppJson<WatchlistPatch>,
) -> Result<AppJson<Watchlist>, AppError> {
    let id = record_id::<Watchlist>(identity.as_ref(), &id)?;
    let write_tx = state.storage.begin_write()?;
    let watchlist = Watchlist::update(&write_tx, identity.as_ref(), id, patch)?;
    write_tx.commit()?;
    Ok(AppJson(watchlist))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/alerts",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    responses((status = OK, body = Vec<Alert>)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn list_alerts(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<AppJson<Vec<Alert>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Alert::list(&read_tx, identity.as_ref()).map(AppJson)
}

#[utoipa::path(
    post,
    path = "/api/v1/me/alerts",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = NewAlert,
    responses((status = OK, body = Alert), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn create_alert(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    AppJson(new): AppJson<NewAlert>,
) -> Result<AppJson<Alert>, AppError> {
    let write_tx = state.storage.begin_write()?;
    let alert = Alert::create(&write_tx, identity.as_ref(), new)?;
    write_tx.commit()?;
    Ok(AppJson(alert))
}

#[utoipa::path(
    patch,
    path = "/api/v1/me/alerts/{id}",
    params(("id" = String, Path, description = "Alert id"), ("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = ToggleBody,
    responses((status = OK, body = Alert), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn toggle_alert(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<ToggleBody>,
) -> Result<AppJson<Alert>, AppError> {
    let id = record_id::<Alert>(identity.as_ref(), &id)?;
    let write_tx = state.storage.begin_write()?;
    let alert = Alert::toggle(&write_tx, identity.as_ref(), id, body.active)?;
    write_tx.commit()?;
    Ok(AppJson(alert))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/annotations",
    params(AnnotationQuery, ("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    responses((status = OK, body = Vec<Annotation>)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn list_annotations(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    Query(query): Query<AnnotationQuery>,
) -> Result<AppJson<Vec<Annotation>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    Annotation::list(&read_tx, identity.as_ref(), query.target.as_deref()).map(AppJson)
}

#[utoipa::path(
    post,
    path = "/api/v1/me/annotations",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = NewAnnotation,
    responses((status = OK, body = Annotation), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn create_annotation(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    AppJson(new): AppJson<NewAnnotation>,
) -> Result<AppJson<Annotation>, AppError> {
    let write_tx = state.storage.begin_write()?;
    let annotation = Annotation::create(&write_tx, identity.as_ref(), new)?;
    write_tx.commit()?;
    Ok(AppJson(annotation))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/api-keys",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    responses((status = OK, body = Vec<ApiKey>)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn list_api_keys(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<AppJson<Vec<ApiKey>>, AppError> {
    let read_tx = state.storage.begin_read()?;
    ApiKey::list(&read_tx, identity.as_ref()).map(AppJson)
}

#[utoipa::path(
    post,
    path = "/api/v1/me/api-keys",
    params(("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = NewApiKey,
    responses((status = OK, body = ApiKey), (status = UNAUTHORIZED, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn create_api_key(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    AppJson(new): AppJson<NewApiKey>,
) -> Result<AppJson<ApiKey>, AppError> {
    let write_tx = state.storage.begin_write()?;
    let api_key = ApiKey::create(&write_tx, identity.as_ref(), new)?;
    write_tx.commit()?;
    Ok(AppJson(api_key))
}

#[utoipa::path(
    patch,
    path = "/api/v1/me/api-keys/{id}",
    params(("id" = String, Path, description = "API key id"), ("x-user-id" = Option<String>, Header, description = "Authenticated user")),
    request_body = ToggleBody,
    responses((status = OK, body = ApiKey), (status = UNAUTHORIZED, body = ErrorResponse), (status = NOT_FOUND, body = ErrorResponse)),
    tag = "User"
)]
#[axum::debug_handler]
pub async fn toggle_api_key(
    State(state): State<RequestState>,
    CallerIdentity(identity): CallerIdentity,
    Path(id): Path<String>,
    AppJson(body): AppJson<ToggleBody>,
) -> Result<AppJson<ApiKey>, AppError> {
    let id = record_id::<ApiKey>(identity.as_ref(), &id)?;
    let write_tx = state.storage.begin_write()?;
    let api_key = ApiKey::toggle(&write_tx, identity.as_ref(), id, body.active)?;
    write_tx.commit()?;
    Ok(AppJson(api_key))
}

pub fn router() -> OpenApiRouter<RequestState> {
    OpenApiRouter::new()
        .routes(routes!(list_watchlists, create_watchlist))
        .routes(routes!(update_watchlist))
        .routes(routes!(list_alerts, create_alert))
        .routes(routes!(toggle_alert))
        .routes(routes!(list_annotations, create_annotation))
        .routes(routes!(list_api_keys, create_api_key))
        .routes(routes!(toggle_api_key))
}
