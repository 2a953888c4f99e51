//! fscan is the query and search layer of a blockchain explorer.
//!
//! Chain records pushed by an upstream indexer are kept in [Redb](https://github.com/cberner/redb) tables
//! with big-endian composite secondary indexes, and served as paginated listings, point lookups,
//! time-windowed statistics and a fan-out free-text search over a JSON HTTP API.

pub mod codec;
pub mod entity;
pub mod error;
pub mod ingest;
pub mod launcher;
pub mod logger;
pub mod merge;
pub mod model;
pub mod pagination;
pub mod query;
pub mod rest;
pub mod routes;
pub mod search;
pub mod settings;
pub mod storage;
pub mod table;
pub mod user;

pub use error::AppError;
pub use merge::AddressTxFilter;
pub use model::{Address, Block, NetworkStat, Token, TokenTransfer, TokenType, Transaction, VolumePoint};
pub use pagination::{Page, PaginationOpts};
pub use rest::{build_router, serve, AppJson, ErrorResponse, RequestState};
pub use search::{SearchRequest, SearchResults, SearchScope};
pub use storage::Storage;
pub use user::{Identity, UserId};
pub use utoipa_axum::router::OpenApiRouter;
