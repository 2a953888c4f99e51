//! Write path for pre-shaped chain records. Each call is one atomic write transaction that keeps
//! the record and all of its secondary and search indexes in step.

use crate::model::{Address, Block, NetworkStat, Token, TokenTransfer, Transaction};
use crate::storage::Storage;
use crate::{debug, AppError};
use redb::WriteTransaction;

fn write<T>(storage: &Storage, f: impl FnOnce(&WriteTransaction) -> Result<T, AppError>) -> Result<T, AppError> {
    let write_tx = storage.begin_write()?;
    let result = f(&write_tx)?;
    write_tx.commit()?;
    Ok(result)
}

pub fn insert_block(storage: &Storage, block: &Block) -> Result<(), AppError> {
    write(storage, |tx| Block::store(tx, block))?;
    debug!("Ingested block {} {}", block.number, block.hash);
    Ok(())
}

pub fn insert_transaction(storage: &Storage, transaction: &Transaction) -> Result<(), AppError> {
    write(storage, |tx| Transaction::store(tx, transaction))?;
    debug!("Ingested transaction {}", transaction.hash);
    Ok(())
}

pub fn upsert_address(storage: &Storage, address: &Address) -> Result<Address, AppError> {
    let stored = write(storage, |tx| Address::upsert(tx, address))?;
    debug!("Upserted address {}", stored.address);
    Ok(stored)
}

pub fn insert_network_stat(storage: &Storage, stat: &NetworkStat) -> Result<(), AppError> {
    write(storage, |tx| NetworkStat::append(tx, stat))?;
    debug!("Ingested network stats at block {}", stat.block_number);
    Ok(())
}

pub fn insert_token(storage: &Storage, token: &Token) -> Result<(), AppError> {
    write(storage, |tx| Token::store(tx, token))?;
    debug!("Ingested token {} {}", token.symbol, token.address);
    Ok(())
}

pub fn insert_token_transfer(storage: &Storage, transfer: &TokenTransfer) -> Result<(), AppError> {
    write(storage, |tx| TokenTransfer::store(tx, transfer))?;
    debug!("Ingested token transfer {}#{}", transfer.transaction_hash, transfer.log_index);
    Ok(())
}
