//! Table layout. Primary tables map a record key to a bincode blob, index tables map a
//! composite key to the primary key of the record it points at.

use crate::codec::{decode, encode};
use crate::AppError;
use redb::{ReadableTable, Table, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub type ByteTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

// number -> Block
pub const BLOCKS: ByteTable = TableDefinition::new("blocks");
pub const BLOCK_BY_HASH: ByteTable = TableDefinition::new("block_by_hash");
pub const BLOCK_BY_TIMESTAMP: ByteTable = TableDefinition::new("block_by_timestamp");

// hash -> Transaction
pub const TRANSACTIONS: ByteTable = TableDefinition::new("transactions");
pub const TX_BY_TIMESTAMP: ByteTable = TableDefinition::new("tx_by_timestamp");
pub const TX_BY_BLOCK: ByteTable = TableDefinition::new("tx_by_block");
pub const TX_BY_FROM: ByteTable = TableDefinition::new("tx_by_from");
pub const TX_BY_TO: ByteTable = TableDefinition::new("tx_by_to");

// address -> Address
pub const ADDRESSES: ByteTable = TableDefinition::new("addresses");
pub const ADDRESS_BY_BALANCE: ByteTable = TableDefinition::new("address_by_balance");

// address -> Token
pub const TOKENS: ByteTable = TableDefinition::new("tokens");
pub const TOKEN_BY_HOLDERS: ByteTable = TableDefinition::new("token_by_holders");
pub const TOKEN_BY_TYPE: ByteTable = TableDefinition::new("token_by_type");

// (transactionHash, logIndex) -> TokenTransfer
pub const TOKEN_TRANSFERS: ByteTable = TableDefinition::new("token_transfers");
pub const TRANSFER_BY_TOKEN: ByteTable = TableDefinition::new("transfer_by_token");

// (timestamp, blockNumber) -> NetworkStat
pub const NETWORK_STATS: ByteTable = TableDefinition::new("network_stats");

pub const SEARCH_TX_HASH: ByteTable = TableDefinition::new("search_tx_hash");
pub const SEARCH_ADDRESS: ByteTable = TableDefinition::new("search_address");
pub const SEARCH_TOKEN_NAME: ByteTable = TableDefinition::new("search_token_name");

// id -> user record
pub const WATCHLISTS: ByteTable = TableDefinition::new("watchlists");
pub const WATCHLIST_BY_USER: ByteTable = TableDefinition::new("watchlist_by_user");
pub const ALERTS: ByteTable = TableDefinition::new("alerts");
pub const ALERT_BY_USER: ByteTable = TableDefinition::new("alert_by_user");
pub const ANNOTATIONS: ByteTable = TableDefinition::new("annotations");
pub const ANNOTATION_BY_USER: ByteTable = TableDefinition::new("annotation_by_user");
pub const ANNOTATION_BY_TARGET: ByteTable = TableDefinition::new("annotation_by_target");
pub const API_KEYS: ByteTable = TableDefinition::new("api_keys");
pub const API_KEY_BY_USER: ByteTable = TableDefinition::new("api_key_by_user");
pub const API_KEY_BY_KEY: ByteTable = TableDefinition::new("api_key_by_key");

pub const ALL_TABLES: &[ByteTable] = &[
    BLOCKS, BLOCK_BY_HASH, BLOCK_BY_TIMESTAMP,
    TRANSACTIONS, TX_BY_TIMESTAMP, TX_BY_BLOCK, TX_BY_FROM, TX_BY_TO,
    ADDRESSES, ADDRESS_BY_BALANCE,
    TOKENS, TOKEN_BY_HOLDERS, TOKEN_BY_TYPE,
    TOKEN_TRANSFERS, TRANSFER_BY_TOKEN,
    NETWORK_STATS,
    SEARCH_TX_HASH, SEARCH_ADDRESS, SEARCH_TOKEN_NAME,
    WATCHLISTS, WATCHLIST_BY_USER,
    ALERTS, ALERT_BY_USER,
    ANNOTATIONS, ANNOTATION_BY_USER, ANNOTATION_BY_TARGET,
    API_KEYS, API_KEY_BY_USER, API_KEY_BY_KEY,
];

pub trait ByteTableRead: ReadableTable<&'static [u8], &'static [u8]> {}
impl<T: ReadableTable<&'static [u8], &'static [u8]>> ByteTableRead for T {}

pub fn get_record<T: DeserializeOwned>(table: &impl ByteTableRead, key: &[u8]) -> Result<Option<T>, AppError> {
    match table.get(key)? {
        Some(guard) => Ok(Some(decode(guard.value())?)),
        None => Ok(None),
    }
}

pub fn get_raw(table: &impl ByteTableRead, key: &[u8]) -> Result<Option<Vec<u8>>, AppError> {
    Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
}

pub fn put_record<T: Serialize>(table: &mut Table<'_, &'static [u8], &'static [u8]>, key: &[u8], record: &T) -> Result<(), AppError> {
    let bytes = encode(record)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

pub fn put_raw(table: &mut Table<'_, &'static [u8], &'static [u8]>, key: &[u8], value: &[u8]) -> Result<(), AppError> {
    table.insert(key, value)?;
    Ok(())
}

pub fn remove(table: &mut Table<'_, &'static [u8], &'static [u8]>, key: &[u8]) -> Result<(), AppError> {
    table.remove(key)?;
    Ok(())
}
