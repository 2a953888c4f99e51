use crate::codec::{decode, KeyBuf};
use crate::model::{Block, VolumePoint};
use crate::pagination::{scan, take, Order, Page, PaginationOpts, ScanRange};
use crate::table::{get_raw, get_record, put_raw, put_record, remove, BLOCKS, BLOCK_BY_HASH, BLOCK_BY_TIMESTAMP};
use crate::entity::WINDOW_CEILING;
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};

impl Block {
    pub fn pk(number: u64) -> Vec<u8> {
        KeyBuf::new().u64(number).build()
    }

    fn timestamp_key(&self) -> Vec<u8> {
        KeyBuf::new().u64(self.timestamp).u64(self.number).build()
    }

    pub fn get(tx: &ReadTransaction, number: u64) -> Result<Option<Block>, AppError> {
        let blocks = tx.open_table(BLOCKS)?;
        get_record(&blocks, &Block::pk(number))
    }

    pub fn get_by_hash(tx: &ReadTransaction, hash: &str) -> Result<Option<Block>, AppError> {
        let by_hash = tx.open_table(BLOCK_BY_HASH)?;
        match get_raw(&by_hash, hash.as_bytes())? {
            Some(pk) => {
                let blocks = tx.open_table(BLOCKS)?;
                get_record(&blocks, &pk)
            }
            None => Ok(None),
        }
    }

    /// Blocks by number, highest first.
    pub fn latest(tx: &ReadTransaction, opts: &PaginationOpts) -> Result<Page<Block>, AppError> {
        let blocks = tx.open_table(BLOCKS)?;
        scan(&blocks, &ScanRange::all(), Order::Desc, opts, |_, bytes| decode(bytes).map(Some))
    }

    /// Throughput of blocks mined at or after `cutoff`, oldest first.
    pub fn volume_history(tx: &ReadTransaction, cutoff: u64) -> Result<Vec<VolumePoint>, AppError> {
        let by_timestamp = tx.open_table(BLOCK_BY_TIMESTAMP)?;
        let blocks = tx.open_table(BLOCKS)?;
        let range = ScanRange::all().from(KeyBuf::new().u64(cutoff).build());
        take(&by_timestamp, &range, Order::Asc, WINDOW_CEILING, |_, pk| {
            Ok(get_record::<Block>(&blocks, pk)?.map(|block| VolumePoint::from(&block)))
        })
    }

    /// Writes the block under its number, replacing the index entries of a previous version.
    pub fn store(write_tx: &WriteTransaction, block: &Block) -> Result<(), AppError> {
        let pk = Block::pk(block.number);
        let mut blocks = write_tx.open_table(BLOCKS)?;
        let mut by_hash = write_tx.open_table(BLOCK_BY_HASH)?;
        let mut by_timestamp = write_tx.open_table(BLOCK_BY_TIMESTAMP)?;

        if let Some(previous) = get_record::<Block>(&blocks, &pk)? {
            remove(&mut by_hash, previous.hash.as_bytes())?;
            remove(&mut by_timestamp, &previous.timestamp_key())?;
        }
        put_record(&mut blocks, &pk, block)?;
        put_raw(&mut by_hash, block.hash.as_bytes(), &pk)?;
        put_raw(&mut by_timestamp, &block.timestamp_key(), &pk)?;
        Ok(())
    }

    pub fn sample(number: u64) -> Block {
        Block {
            number,
            hash: format!("0xb{:063x}", number),
            parent_hash: format!("0xb{:063x}", number.saturating_sub(1)),
            timestamp: 1_700_000_000_000 + number * 12_000,
            gas_used: "21000".to_string(),
            gas_limit: "30000000".to_string(),
            difficulty: "0".to_string(),
            total_difficulty: "58750003716598352816469".to_string(),
            size: 1024,
            transaction_count: 1,
            miner: "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5".to_string(),
            reward: "2000000000000000000".to_string(),
            extra_data: None,
            nonce: "0x0000000000000000".to_string(),
        }
    }
}
