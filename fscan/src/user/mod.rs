//! Per-user records: watchlists, alerts, annotations and API keys.
//!
//! Every operation takes the caller's identity explicitly. Queries without an identity yield
//! nothing, mutations without one fail with `Unauthenticated`.

pub mod alert;
pub mod annotation;
pub mod api_key;
pub mod watchlist;

use crate::codec::{decode, KeyBuf};
use crate::pagination::{take, Order, ScanRange};
use crate::table::{get_record, ByteTable, ByteTableRead};
use crate::AppError;
use redb::ReadTransaction;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum number of records a single listing returns.
pub const USER_LIST_CEILING: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An authenticated caller, resolved by the upstream authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub UserId);

impl Identity {
    pub fn new(user_id: &str) -> Self {
        Identity(UserId(user_id.to_string()))
    }

    pub fn user_id(&self) -> &UserId {
        &self.0
    }

    pub fn require(identity: Option<&Identity>) -> Result<&Identity, AppError> {
        identity.ok_or_else(AppError::not_authenticated)
    }
}

/// A record that belongs to exactly one user.
pub trait Owned {
    const KIND: &'static str;
    fn owner(&self) -> &UserId;
}

pub(crate) fn id_key(id: u64) -> Vec<u8> {
    KeyBuf::new().u64(id).build()
}

pub(crate) fn owner_key(user_id: &UserId, id: u64) -> Vec<u8> {
    KeyBuf::new().str(user_id.as_str()).u64(id).build()
}

/// Next free id of a table keyed by big-endian u64.
pub(crate) fn next_id(table: &impl ByteTableRead) -> Result<u64, AppError> {
    match table.last()? {
        Some((key, _)) => {
            let mut buf = [0u8; 8];
            let bytes = key.value();
            if bytes.len() != 8 {
                return Err(AppError::Custom(format!("Malformed id key of {} bytes", bytes.len())));
            }
            buf.copy_from_slice(bytes);
            Ok(u64::from_be_bytes(buf) + 1)
        }
        None => Ok(1),
    }
}

/// All records of `identity` through its by-user index, oldest first.
pub(crate) fn list_owned<T: DeserializeOwned>(
    tx: &ReadTransaction,
    records_def: ByteTable,
    by_user_def: ByteTable,
    identity: Option<&Identity>,
) -> Result<Vec<T>, AppError> {
    let Some(identity) = identity else {
        return Ok(Vec::new());
    };
    let records = tx.open_table(records_def)?;
    let by_user = tx.open_table(by_user_def)?;
    let range = ScanRange::prefix(KeyBuf::new().str(identity.user_id().as_str()).build());
    take(&by_user, &range, Order::Asc, USER_LIST_CEILING, |_, pk| get_record(&records, pk))
}

/// Loads record `id` if it belongs to `identity`; a missing or foreign record is reported the same way.
pub(crate) fn load_owned<T: DeserializeOwned + Owned>(records: &impl ByteTableRead, id: u64, identity: &Identity) -> Result<T, AppError> {
    let denied = || AppError::NotFound(format!("{} not found or access denied", T::KIND));
    let guard = records.get(id_key(id).as_slice())?.ok_or_else(denied)?;
    let record: T = decode(guard.value())?;
    if record.owner() != identity.user_id() {
        return Err(denied());
    }
    Ok(record)
}
