//! Transactions touching an address, merged from the sender and recipient indexes.

use crate::model::Transaction;
use crate::pagination::{Page, PaginationOpts};
use crate::AppError;
use redb::ReadTransaction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::str::FromStr;
use utoipa::ToSchema;

/// Most recent transactions fetched from each side before merging.
pub const MERGE_SOURCE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AddressTxFilter {
    #[default]
    All,
    Outgoing,
    Incoming,
}

impl FromStr for AddressTxFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(AddressTxFilter::All),
            "outgoing" | "from" => Ok(AddressTxFilter::Outgoing),
            "incoming" | "to" => Ok(AddressTxFilter::Incoming),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// Transactions of `address` newest first.
///
/// `Outgoing` and `Incoming` page through a single index. `All` merges the most recent
/// [`MERGE_SOURCE_LIMIT`] transactions of each side and cannot be continued: the page never
/// carries a cursor, and `is_done` only reflects whether the merged set filled the page.
pub fn address_transactions(
    tx: &ReadTransaction,
    address: &str,
    filter: AddressTxFilter,
    opts: &PaginationOpts,
) -> Result<Page<Transaction>, AppError> {
    match filter {
        AddressTxFilter::Outgoing => Transaction::by_sender(tx, address, opts),
        AddressTxFilter::Incoming => Transaction::by_recipient(tx, address, opts),
        AddressTxFilter::All => {
            let sources = PaginationOpts::first(MERGE_SOURCE_LIMIT);
            let sent = Transaction::by_sender(tx, address, &sources)?;
            let received = Transaction::by_recipient(tx, address, &sources)?;
            Ok(merge(sent.page, received.page, opts.limit()))
        }
    }
}

fn merge(sent: Vec<Transaction>, received: Vec<Transaction>, limit: usize) -> Page<Transaction> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Transaction> = sent
        .into_iter()
        .chain(received)
        .filter(|t| seen.insert(t.hash.clone()))
        .collect();
    merged.sort_by_key(|t| Reverse((t.timestamp, t.hash.clone())));
    merged.truncate(limit);
    let is_done = merged.len() < limit;
    Page { page: merged, is_done, continue_cursor: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn directions_accept_aliases() {
        assert_eq!(AddressTxFilter::from_str("from").unwrap(), AddressTxFilter::Outgoing);
        assert_eq!(AddressTxFilter::from_str("Incoming").unwrap(), AddressTxFilter::Incoming);
        assert!(AddressTxFilter::from_str("sideways").is_err());
    }

    #[test]
    fn merge_orders_by_timestamp_and_drops_self_transfer_duplicates() {
        let a = "0xa";
        let sent = vec![
            Transaction::sample("0x3", a, Some(a), 300),
            Transaction::sample("0x1", a, Some("0xb"), 100),
        ];
        let received = vec![
            Transaction::sample("0x3", a, Some(a), 300),
            Transaction::sample("0x2", "0xb", Some(a), 200),
        ];
        let page = merge(sent, received, 10);
        let hashes: Vec<&str> = page.page.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0x3", "0x2", "0x1"]);
        assert!(page.is_done);
        assert!(page.continue_cursor.is_none());
    }

    #[test]
    fn merge_truncates_and_reports_not_done_on_full_page() {
        let sent = (0..5).map(|i| Transaction::sample(&format!("0xs{}", i), "0xa", None, i)).collect();
        let page = merge(sent, Vec::new(), 3);
        assert_eq!(page.page.len(), 3);
        assert!(!page.is_done);
        assert!(page.continue_cursor.is_none());
    }

    #[test]
    fn all_direction_merges_only_the_newest_of_each_side() {
        let storage = Storage::temp("merge_source_limit", 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        let extra = 10u64;
        for n in 0..(MERGE_SOURCE_LIMIT as u64 + extra) {
            Transaction::store(&write_tx, &Transaction::sample(&format!("0xs{}", n), "0xa", Some("0xb"), 1_000 + n))
                .expect("Failed to store transaction");
            Transaction::store(&write_tx, &Transaction::sample(&format!("0xr{}", n), "0xb", Some("0xa"), n))
                .expect("Failed to store transaction");
        }
        write_tx.commit().expect("Failed to commit");

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let page = address_transactions(&read_tx, "0xa", AddressTxFilter::All, &PaginationOpts::first(2 * MERGE_SOURCE_LIMIT))
            .expect("Failed to list address transactions");
        assert_eq!(page.page.len(), 2 * MERGE_SOURCE_LIMIT);
        let hashes: HashSet<&str> = page.page.iter().map(|t| t.hash.as_str()).collect();
        // older outgoing ones would outrank every incoming one in a global merge
        assert!(!hashes.contains("0xs0"));
        assert!(!hashes.contains(format!("0xs{}", extra - 1).as_str()));
        assert!(hashes.contains(format!("0xs{}", extra).as_str()));
        assert!(hashes.contains(format!("0xr{}", extra).as_str()));
        assert!(!hashes.contains(format!("0xr{}", extra - 1).as_str()));
        assert_eq!(page.page.first().map(|t| t.timestamp), Some(1_000 + MERGE_SOURCE_LIMIT as u64 + extra - 1));
    }
}
