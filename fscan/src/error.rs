use axum::extract::rejection::{JsonRejection, QueryRejection};
use http::StatusCode;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum AppError {

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json rejection: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Query rejection: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Join: {0}")]
    JoinError(#[from] JoinError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_)        => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)      => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::JsonRejection(r)   => r.status(),
            AppError::QueryRejection(r)  => r.status(),
            _                            => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_authenticated() -> Self {
        AppError::Unauthenticated("Not authenticated".to_string())
    }
}
