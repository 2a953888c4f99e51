use crate::codec::{decode, KeyBuf};
use crate::entity::WINDOW_CEILING;
use crate::model::NetworkStat;
use crate::pagination::{scan, take, Order, Page, PaginationOpts, ScanRange};
use crate::table::{put_record, NETWORK_STATS};
use crate::AppError;
use redb::{ReadTransaction, ReadableTable, WriteTransaction};

impl NetworkStat {
    fn slot(&self) -> KeyBuf {
        KeyBuf::new().u64(self.timestamp).u64(self.block_number)
    }

    /// Snapshots sharing timestamp and block are told apart by `seq`, in arrival order.
    pub fn pk(&self, seq: u32) -> Vec<u8> {
        self.slot().u32(seq).build()
    }

    fn since(cutoff: u64) -> ScanRange {
        ScanRange::all().from(KeyBuf::new().u64(cutoff).build())
    }

    /// The snapshot with the greatest timestamp.
    pub fn latest(tx: &ReadTransaction) -> Result<Option<NetworkStat>, AppError> {
        let stats = tx.open_table(NETWORK_STATS)?;
        let latest = match stats.last()? {
            Some((_, value)) => Some(decode(value.value())?),
            None => None,
        };
        Ok(latest)
    }

    /// Snapshots taken at or after `cutoff`, newest first.
    pub fn history(tx: &ReadTransaction, cutoff: u64, opts: &PaginationOpts) -> Result<Page<NetworkStat>, AppError> {
        let stats = tx.open_table(NETWORK_STATS)?;
        scan(&stats, &NetworkStat::since(cutoff), Order::Desc, opts, |_, bytes| decode(bytes).map(Some))
    }

    /// Snapshots taken at or after `cutoff`, oldest first.
    pub fn gas_price_history(tx: &ReadTransaction, cutoff: u64) -> Result<Vec<NetworkStat>, AppError> {
        let stats = tx.open_table(NETWORK_STATS)?;
        take(&stats, &NetworkStat::since(cutoff), Order::Asc, WINDOW_CEILING, |_, bytes| decode(bytes).map(Some))
    }

    /// Stores `stat` next to any snapshot already taken at the same timestamp and block.
    pub fn append(write_tx: &WriteTransaction, stat: &NetworkStat) -> Result<(), AppError> {
        let mut stats = write_tx.open_table(NETWORK_STATS)?;
        let slot = ScanRange::prefix(stat.slot().build());
        let taken = take(&stats, &slot, Order::Desc, 1, |key, _| Ok(Some(seq_of(key))))?;
        let seq = match taken.first() {
            Some(Some(last)) => last.checked_add(1).ok_or_else(|| AppError::Custom("Stat sequence exhausted".to_string()))?,
            Some(None) => return Err(AppError::Custom("Malformed stat key".to_string())),
            None => 0,
        };
        put_record(&mut stats, &stat.pk(seq), stat)
    }

    pub fn sample(timestamp: u64, block_number: u64) -> NetworkStat {
        NetworkStat {
            timestamp,
            block_number,
            hash_rate: "0".to_string(),
            difficulty: "0".to_string(),
            gas_price: format!("{}", 20_000_000_000u64 + block_number),
            pending_transactions: 150,
            active_addresses: 1200,
            total_transactions: block_number * 100,
            market_cap: None,
            price: Some("3150.25".to_string()),
        }
    }
}

fn seq_of(key: &[u8]) -> Option<u32> {
    let tail: [u8; 4] = key.get(16..)?.try_into().ok()?;
    Some(u32::from_be_bytes(tail))
}
