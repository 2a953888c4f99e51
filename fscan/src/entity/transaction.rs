use crate::codec::KeyBuf;
use crate::model::{Block, Transaction};
use crate::pagination::{scan, Order, Page, PaginationOpts, ScanRange};
use crate::table::{get_record, put_raw, put_record, remove, ByteTable, SEARCH_TX_HASH, TRANSACTIONS, TX_BY_BLOCK, TX_BY_FROM, TX_BY_TIMESTAMP, TX_BY_TO};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};

impl Transaction {
    pub fn pk(hash: &str) -> Vec<u8> {
        KeyBuf::new().text(hash).build()
    }

    fn timestamp_key(&self) -> Vec<u8> {
        KeyBuf::new().u64(self.timestamp).text(&self.hash).build()
    }

    fn block_key(&self) -> Vec<u8> {
        KeyBuf::new().u64(self.block_number).u32(self.transaction_index).text(&self.hash).build()
    }

    fn party_key(party: &str, timestamp: u64, hash: &str) -> Vec<u8> {
        KeyBuf::new().str(party).u64(timestamp).text(hash).build()
    }

    fn search_key(&self) -> Vec<u8> {
        KeyBuf::new().str(&self.hash.to_lowercase()).text(&self.hash).build()
    }

    pub fn get_by_hash(tx: &ReadTransaction, hash: &str) -> Result<Option<Transaction>, AppError> {
        let transactions = tx.open_table(TRANSACTIONS)?;
        get_record(&transactions, &Transaction::pk(hash))
    }

    /// Transactions by timestamp, newest first.
    pub fn latest(tx: &ReadTransaction, opts: &PaginationOpts) -> Result<Page<Transaction>, AppError> {
        Self::by_index(tx, TX_BY_TIMESTAMP, ScanRange::all(), Order::Desc, opts)
    }

    /// Transactions of one block by position in the block.
    pub fn by_block(tx: &ReadTransaction, number: u64, opts: &PaginationOpts) -> Result<Page<Transaction>, AppError> {
        Self::by_index(tx, TX_BY_BLOCK, ScanRange::prefix(KeyBuf::new().u64(number).build()), Order::Asc, opts)
    }

    /// Transactions sent by `address`, newest first.
    pub fn by_sender(tx: &ReadTransaction, address: &str, opts: &PaginationOpts) -> Result<Page<Transaction>, AppError> {
        Self::by_index(tx, TX_BY_FROM, ScanRange::prefix(KeyBuf::new().str(address).build()), Order::Desc, opts)
    }

    /// Transactions received by `address`, newest first.
    pub fn by_recipient(tx: &ReadTransaction, address: &str, opts: &PaginationOpts) -> Result<Page<Transaction>, AppError> {
        Self::by_index(tx, TX_BY_TO, ScanRange::prefix(KeyBuf::new().str(address).build()), Order::Desc, opts)
    }

    /// Transactions whose hash starts with `query`, compared case-insensitively.
    pub fn search(tx: &ReadTransaction, query: &str, opts: &PaginationOpts) -> Result<Page<Transaction>, AppError> {
        Self::by_index(tx, SEARCH_TX_HASH, ScanRange::prefix(KeyBuf::new().text(&query.to_lowercase()).build()), Order::Asc, opts)
    }

    fn by_index(
        tx: &ReadTransaction,
        index_def: ByteTable,
        range: ScanRange,
        order: Order,
        opts: &PaginationOpts,
    ) -> Result<Page<Transaction>, AppError> {
        let index = tx.open_table(index_def)?;
        let transactions = tx.open_table(TRANSACTIONS)?;
        scan(&index, &range, order, opts, |_, pk| get_record(&transactions, pk))
    }

    /// Writes the transaction under its hash, replacing the index entries of a previous version.
    pub fn store(write_tx: &WriteTransaction, transaction: &Transaction) -> Result<(), AppError> {
        let pk = Transaction::pk(&transaction.hash);
        let mut transactions = write_tx.open_table(TRANSACTIONS)?;
        let mut by_timestamp = write_tx.open_table(TX_BY_TIMESTAMP)?;
        let mut by_block = write_tx.open_table(TX_BY_BLOCK)?;
        let mut by_from = write_tx.open_table(TX_BY_FROM)?;
        let mut by_to = write_tx.open_table(TX_BY_TO)?;
        let mut search = write_tx.open_table(SEARCH_TX_HASH)?;

        if let Some(previous) = get_record::<Transaction>(&transactions, &pk)? {
            remove(&mut by_timestamp, &previous.timestamp_key())?;
            remove(&mut by_block, &previous.block_key())?;
            remove(&mut by_from, &Transaction::party_key(&previous.from, previous.timestamp, &previous.hash))?;
            if let Some(to) = &previous.to {
                remove(&mut by_to, &Transaction::party_key(to, previous.timestamp, &previous.hash))?;
            }
        }

        put_record(&mut transactions, &pk, transaction)?;
        put_raw(&mut by_timestamp, &transaction.timestamp_key(), &pk)?;
        put_raw(&mut by_block, &transaction.block_key(), &pk)?;
        put_raw(&mut by_from, &Transaction::party_key(&transaction.from, transaction.timestamp, &transaction.hash), &pk)?;
        if let Some(to) = &transaction.to {
            put_raw(&mut by_to, &Transaction::party_key(to, transaction.timestamp, &transaction.hash), &pk)?;
        }
        put_raw(&mut search, &transaction.search_key(), &pk)?;
        Ok(())
    }

    pub fn sample(hash: &str, from: &str, to: Option<&str>, timestamp: u64) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            block_number: 1,
            block_hash: Block::sample(1).hash,
            transaction_index: 0,
            from: from.to_string(),
            to: to.map(str::to_string),
            value: "1000000000000000000".to_string(),
            gas: "21000".to_string(),
            gas_price: "20000000000".to_string(),
            gas_used: Some("21000".to_string()),
            status: Some(1),
            timestamp,
            input: None,
            contract_address: None,
            cumulative_gas_used: None,
            effective_gas_price: None,
        }
    }
}
