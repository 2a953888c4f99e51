use crate::codec::{is_decimal, KeyBuf};
use crate::model::Address;
use crate::pagination::{scan, Order, Page, PaginationOpts, ScanRange};
use crate::table::{get_record, put_raw, put_record, remove, ADDRESSES, ADDRESS_BY_BALANCE, SEARCH_ADDRESS};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};

impl Address {
    pub fn pk(address: &str) -> Vec<u8> {
        KeyBuf::new().text(address).build()
    }

    fn balance_key(&self) -> Vec<u8> {
        KeyBuf::new().decimal(&self.balance).text(&self.address).build()
    }

    fn search_key(&self) -> Vec<u8> {
        KeyBuf::new().str(&self.address.to_lowercase()).text(&self.address).build()
    }

    pub fn get(tx: &ReadTransaction, address: &str) -> Result<Option<Address>, AppError> {
        let addresses = tx.open_table(ADDRESSES)?;
        get_record(&addresses, &Address::pk(address))
    }

    /// Richest addresses first.
    pub fn top_by_balance(tx: &ReadTransaction, opts: &PaginationOpts) -> Result<Page<Address>, AppError> {
        let by_balance = tx.open_table(ADDRESS_BY_BALANCE)?;
        let addresses = tx.open_table(ADDRESSES)?;
        scan(&by_balance, &ScanRange::all(), Order::Desc, opts, |_, pk| get_record(&addresses, pk))
    }

    /// Addresses starting with `query` case-insensitively, optionally only contracts.
    pub fn search(tx: &ReadTransaction, query: &str, contracts_only: bool, opts: &PaginationOpts) -> Result<Page<Address>, AppError> {
        let search = tx.open_table(SEARCH_ADDRESS)?;
        let addresses = tx.open_table(ADDRESSES)?;
        let range = ScanRange::prefix(KeyBuf::new().text(&query.to_lowercase()).build());
        scan(&search, &range, Order::Asc, opts, |_, pk| {
            Ok(get_record::<Address>(&addresses, pk)?.filter(|a| !contracts_only || a.is_contract))
        })
    }

    /// Inserts a new address, or refreshes `balance`, `transaction_count` and `last_seen` of an
    /// existing one leaving every other field untouched. Returns the stored record.
    pub fn upsert(write_tx: &WriteTransaction, incoming: &Address) -> Result<Address, AppError> {
        if !is_decimal(&incoming.balance) {
            return Err(AppError::BadRequest(format!("Balance of {} must be a decimal integer", incoming.address)));
        }
        let pk = Address::pk(&incoming.address);
        let mut addresses = write_tx.open_table(ADDRESSES)?;
        let mut by_balance = write_tx.open_table(ADDRESS_BY_BALANCE)?;

        let stored = match get_record::<Address>(&addresses, &pk)? {
            Some(existing) => {
                remove(&mut by_balance, &existing.balance_key())?;
                Address {
                    balance: incoming.balance.clone(),
                    transaction_count: incoming.transaction_count,
                    last_seen: incoming.last_seen,
                    ..existing
                }
            }
            None => {
                let mut search = write_tx.open_table(SEARCH_ADDRESS)?;
                put_raw(&mut search, &incoming.search_key(), &pk)?;
                incoming.clone()
            }
        };
        put_record(&mut addresses, &pk, &stored)?;
        put_raw(&mut by_balance, &stored.balance_key(), &pk)?;
        Ok(stored)
    }

    pub fn sample(address: &str, balance: &str) -> Address {
        Address {
            address: address.to_string(),
            balance: balance.to_string(),
            transaction_count: 1,
            first_seen: 1_700_000_000_000,
            last_seen: 1_700_000_000_000,
            is_contract: false,
            contract_name: None,
            contract_source: None,
            contract_abi: None,
            tags: Vec::new(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::SCAN_CEILING;
    use crate::storage::Storage;

    fn upsert_all(storage: &Storage, addresses: &[Address]) {
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        for address in addresses {
            Address::upsert(&write_tx, address).expect("Failed to upsert address");
        }
        write_tx.commit().expect("Failed to commit");
    }

    #[test]
    fn it_should_return_none_for_unknown_address() {
        let storage = Storage::temp("address_absent", 8, true).expect("Failed to create storage");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        assert!(Address::get(&read_tx, "0xdead").expect("Failed to get address").is_none());
    }

    #[test]
    fn it_should_refresh_only_volatile_fields_on_upsert() {
        let storage = Storage::temp("address_upsert", 8, true).expect("Failed to create storage");
        let mut first = Address::sample("0xc0ffee", "100");
        first.is_contract = true;
        first.label = Some("Exchange".to_string());
        upsert_all(&storage, &[first.clone()]);

        let mut second = Address::sample("0xc0ffee", "250");
        second.transaction_count = 9;
        second.first_seen = 42;
        second.last_seen = 1_800_000_000_000;
        upsert_all(&storage, &[second]);

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let stored = Address::get(&read_tx, "0xc0ffee").expect("Failed to get address").expect("Address should exist");
        assert_eq!(stored.balance, "250");
        assert_eq!(stored.transaction_count, 9);
        assert_eq!(stored.last_seen, 1_800_000_000_000);
        assert_eq!(stored.first_seen, first.first_seen);
        assert!(stored.is_contract);
        assert_eq!(stored.label.as_deref(), Some("Exchange"));
    }

    #[test]
    fn it_should_rank_by_numeric_balance() {
        let storage = Storage::temp("address_top", 8, true).expect("Failed to create storage");
        upsert_all(&storage, &[
            Address::sample("0x01", "9"),
            Address::sample("0x02", "100000000000000000000"),
            Address::sample("0x03", "10"),
        ]);
        // balance change must move the address within the ranking
        upsert_all(&storage, &[Address::sample("0x01", "11")]);

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let page = Address::top_by_balance(&read_tx, &PaginationOpts::first(10)).expect("Failed to list top addresses");
        let ranked: Vec<&str> = page.page.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(ranked, vec!["0x02", "0x01", "0x03"]);
    }

    #[test]
    fn it_should_search_contracts_only() {
        let storage = Storage::temp("address_search", 8, true).expect("Failed to create storage");
        let mut contract = Address::sample("0xABC123", "0");
        contract.is_contract = true;
        upsert_all(&storage, &[contract, Address::sample("0xabc999", "0"), Address::sample("0xfff000", "0")]);

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let all = Address::search(&read_tx, "0xabc", false, &PaginationOpts::first(10)).expect("Failed to search");
        assert_eq!(all.page.len(), 2);
        let contracts = Address::search(&read_tx, "0xabc", true, &PaginationOpts::first(10)).expect("Failed to search");
        assert_eq!(contracts.page.len(), 1);
        assert_eq!(contracts.page[0].address, "0xABC123");
    }

    #[test]
    fn it_should_resume_filtered_search_past_the_scan_ceiling() {
        let storage = Storage::temp("address_search_ceiling", 8, true).expect("Failed to create storage");
        let mut plain: Vec<Address> = (0..SCAN_CEILING + 50).map(|n| Address::sample(&format!("0xabc{:05}", n), "1")).collect();
        let mut contract = Address::sample("0xabcz", "1");
        contract.is_contract = true;
        plain.push(contract);
        upsert_all(&storage, &plain);

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let first = Address::search(&read_tx, "0xabc", true, &PaginationOpts::first(10)).expect("Failed to search");
        assert!(first.page.is_empty());
        assert!(!first.is_done);
        assert!(first.continue_cursor.is_some());

        let next = Address::search(&read_tx, "0xabc", true, &PaginationOpts::new(10, first.continue_cursor)).expect("Failed to search");
        assert!(next.is_done);
        let found: Vec<&str> = next.page.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(found, vec!["0xabcz"]);
    }

    #[test]
    fn it_should_reject_non_decimal_balance() {
        let storage = Storage::temp("address_bad_balance", 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        let err = Address::upsert(&write_tx, &Address::sample("0xc0ffee", "1.5e18")).expect_err("Balance should be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
        write_tx.commit().expect("Failed to commit");

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        assert!(Address::get(&read_tx, "0xc0ffee").expect("Failed to get address").is_none());
    }
}
