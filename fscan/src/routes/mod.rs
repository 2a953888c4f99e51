pub mod chain;
pub mod search;
pub mod user;
pub mod webhook;

use crate::rest::{AppJson, RequestState};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Health {
    pub status: String,
}

#[utoipa::path(get, path = "/health", responses((status = OK, body = Health)), tag = "Health")]
pub async fn health() -> AppJson<Health> {
    AppJson(Health { status: "ok".to_string() })
}

pub fn router() -> OpenApiRouter<RequestState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(chain::router())
        .merge(search::router())
        .merge(webhook::router())
        .merge(user::router())
}
