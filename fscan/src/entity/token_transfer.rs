use crate::codec::{decode, KeyBuf};
use crate::entity::WINDOW_CEILING;
use crate::model::TokenTransfer;
use crate::pagination::{scan, take, Order, Page, PaginationOpts, ScanRange};
use crate::table::{get_record, put_raw, put_record, remove, TOKEN_TRANSFERS, TRANSFER_BY_TOKEN};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};

impl TokenTransfer {
    pub fn pk(transaction_hash: &str, log_index: u32) -> Vec<u8> {
        KeyBuf::new().str(transaction_hash).u32(log_index).build()
    }

    fn token_key(&self, pk: &[u8]) -> Vec<u8> {
        KeyBuf::new().str(&self.token_address).u64(self.timestamp).bytes(pk).build()
    }

    /// Transfers of one token, newest first.
    pub fn by_token(tx: &ReadTransaction, token_address: &str, opts: &PaginationOpts) -> Result<Page<TokenTransfer>, AppError> {
        let by_token = tx.open_table(TRANSFER_BY_TOKEN)?;
        let transfers = tx.open_table(TOKEN_TRANSFERS)?;
        let range = ScanRange::prefix(KeyBuf::new().str(token_address).build());
        scan(&by_token, &range, Order::Desc, opts, |_, pk| get_record(&transfers, pk))
    }

    /// Transfers emitted by one transaction in log order.
    pub fn by_transaction(tx: &ReadTransaction, transaction_hash: &str) -> Result<Vec<TokenTransfer>, AppError> {
        let transfers = tx.open_table(TOKEN_TRANSFERS)?;
        let range = ScanRange::prefix(KeyBuf::new().str(transaction_hash).build());
        take(&transfers, &range, Order::Asc, WINDOW_CEILING, |_, bytes| decode(bytes).map(Some))
    }

    pub fn store(write_tx: &WriteTransaction, transfer: &TokenTransfer) -> Result<(), AppError> {
        let pk = TokenTransfer::pk(&transfer.transaction_hash, transfer.log_index);
        let mut transfers = write_tx.open_table(TOKEN_TRANSFERS)?;
        let mut by_token = write_tx.open_table(TRANSFER_BY_TOKEN)?;

        if let Some(previous) = get_record::<TokenTransfer>(&transfers, &pk)? {
            remove(&mut by_token, &previous.token_key(&pk))?;
        }
        put_record(&mut transfers, &pk, transfer)?;
        put_raw(&mut by_token, &transfer.token_key(&pk), &pk)?;
        Ok(())
    }

    pub fn sample(transaction_hash: &str, log_index: u32, token_address: &str, timestamp: u64) -> TokenTransfer {
        TokenTransfer {
            transaction_hash: transaction_hash.to_string(),
            block_number: 1,
            timestamp,
            from: "0xa11ce".to_string(),
            to: "0xb0b".to_string(),
            token_address: token_address.to_string(),
            value: "5000000".to_string(),
            token_id: None,
            log_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn it_should_list_transfers_by_token_and_transaction() {
        let storage = Storage::temp("token_transfers", 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        for transfer in [
            TokenTransfer::sample("0xt1", 1, "0xusdt", 100),
            TokenTransfer::sample("0xt1", 0, "0xdai", 100),
            TokenTransfer::sample("0xt2", 0, "0xusdt", 200),
        ] {
            TokenTransfer::store(&write_tx, &transfer).expect("Failed to store transfer");
        }
        write_tx.commit().expect("Failed to commit");

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let usdt = TokenTransfer::by_token(&read_tx, "0xusdt", &PaginationOpts::first(10)).expect("Failed to list transfers");
        let hashes: Vec<&str> = usdt.page.iter().map(|t| t.transaction_hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xt2", "0xt1"]);

        let in_tx = TokenTransfer::by_transaction(&read_tx, "0xt1").expect("Failed to list transfers");
        let logs: Vec<u32> = in_tx.iter().map(|t| t.log_index).collect();
        assert_eq!(logs, vec![0, 1]);
    }
}
