//! Cursor pagination over ordered index tables.
//!
//! A cursor is the base64url encoding of the last index key of a page. Scans resume strictly
//! after (ascending) or before (descending) that key, so concurrent inserts never shift a page.

use crate::codec::prefix_upper_bound;
use crate::table::ByteTableRead;
use crate::AppError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use redb::{AccessGuard, StorageError};
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOpts {
    pub num_items: usize,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PaginationOpts {
    pub fn new(num_items: usize, cursor: Option<String>) -> Self {
        PaginationOpts { num_items, cursor }
    }

    pub fn first(num_items: usize) -> Self {
        PaginationOpts { num_items, cursor: None }
    }

    pub fn limit(&self) -> usize {
        self.num_items.max(1)
    }

    fn decode_cursor(&self) -> Result<Option<Vec<u8>>, AppError> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(None),
            Some(c) => URL_SAFE_NO_PAD
                .decode(c)
                .map(Some)
                .map_err(|_| AppError::BadRequest("Invalid cursor".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: Vec<T>,
    pub is_done: bool,
    pub continue_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page { page: Vec::new(), is_done: true, continue_cursor: None }
    }

    pub fn len(&self) -> usize {
        self.page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }
}

/// Key interval of a scan: every key starting with `prefix`, optionally no lower than `floor`.
#[derive(Debug, Clone, Default)]
pub struct ScanRange {
    prefix: Vec<u8>,
    floor: Option<Vec<u8>>,
}

impl ScanRange {
    pub fn all() -> Self {
        ScanRange::default()
    }

    pub fn prefix(prefix: Vec<u8>) -> Self {
        ScanRange { prefix, floor: None }
    }

    pub fn from(mut self, floor: Vec<u8>) -> Self {
        self.floor = Some(floor);
        self
    }

    fn lower(&self) -> &[u8] {
        match &self.floor {
            Some(floor) if floor.as_slice() > self.prefix.as_slice() => floor,
            _ => &self.prefix,
        }
    }
}

/// Most index entries a single page request visits, accepted or not.
pub const SCAN_CEILING: usize = 2048;

/// Reads one page of `index` in `order`, resolving each entry through `resolve`.
///
/// Entries for which `resolve` yields `None` are skipped, which is how filters and dangling
/// index entries are handled. One extra resolvable entry is looked ahead to determine `is_done`.
/// At most [`SCAN_CEILING`] entries are visited, a page cut short by it is not done and
/// continues after the last visited entry.
pub fn scan<T, R, F>(index: &R, range: &ScanRange, order: Order, opts: &PaginationOpts, resolve: F) -> Result<Page<T>, AppError>
where
    R: ByteTableRead,
    F: FnMut(&[u8], &[u8]) -> Result<Option<T>, AppError>,
{
    scan_within(index, range, order, opts, SCAN_CEILING, resolve)
}

pub(crate) fn scan_within<T, R, F>(
    index: &R,
    range: &ScanRange,
    order: Order,
    opts: &PaginationOpts,
    budget: usize,
    resolve: F,
) -> Result<Page<T>, AppError>
where
    R: ByteTableRead,
    F: FnMut(&[u8], &[u8]) -> Result<Option<T>, AppError>,
{
    let cursor = opts.decode_cursor()?;
    let upper = prefix_upper_bound(&range.prefix);
    let lower = range.lower().to_vec();

    // a cursor left behind by a window floor that has since moved up
    let mut stale = false;
    if let Some(c) = &cursor {
        if !c.starts_with(&range.prefix) {
            return Err(AppError::BadRequest("Invalid cursor".to_string()));
        }
        stale = c.as_slice() < lower.as_slice();
    }
    if stale && order == Order::Desc {
        return Ok(Page::empty());
    }

    let lower_bound: Bound<&[u8]> = match (order, cursor.as_deref()) {
        (Order::Asc, Some(c)) if !stale => Bound::Excluded(c),
        _ if lower.is_empty() => Bound::Unbounded,
        _ => Bound::Included(lower.as_slice()),
    };
    let upper_bound: Bound<&[u8]> = match (order, cursor.as_deref(), upper.as_deref()) {
        (Order::Desc, Some(c), _) => Bound::Excluded(c),
        (_, _, Some(u)) => Bound::Excluded(u),
        (_, _, None) => Bound::Unbounded,
    };

    let entries = index.range::<&[u8]>((lower_bound, upper_bound))?;
    let budget = budget.max(opts.limit() + 1);
    match order {
        Order::Asc => collect_page(entries, opts.limit(), budget, resolve),
        Order::Desc => collect_page(entries.rev(), opts.limit(), budget, resolve),
    }
}

/// Reads at most `max` entries without pagination.
pub fn take<T, R, F>(index: &R, range: &ScanRange, order: Order, max: usize, resolve: F) -> Result<Vec<T>, AppError>
where
    R: ByteTableRead,
    F: FnMut(&[u8], &[u8]) -> Result<Option<T>, AppError>,
{
    Ok(scan(index, range, order, &PaginationOpts::first(max), resolve)?.page)
}

fn collect_page<'a, I, T, F>(entries: I, limit: usize, budget: usize, mut resolve: F) -> Result<Page<T>, AppError>
where
    I: Iterator<Item = Result<(AccessGuard<'a, &'static [u8]>, AccessGuard<'a, &'static [u8]>), StorageError>>,
    F: FnMut(&[u8], &[u8]) -> Result<Option<T>, AppError>,
{
    let mut page = Vec::with_capacity(limit.min(128));
    let mut last_emitted: Option<Vec<u8>> = None;
    let mut last_visited: Option<Vec<u8>> = None;
    let mut visited = 0usize;
    for entry in entries {
        let (key, value) = entry?;
        if visited == budget {
            let continue_cursor = last_visited.map(|k| URL_SAFE_NO_PAD.encode(k));
            return Ok(Page { page, is_done: false, continue_cursor });
        }
        visited += 1;
        if let Some(item) = resolve(key.value(), value.value())? {
            if page.len() == limit {
                let continue_cursor = last_emitted.map(|k| URL_SAFE_NO_PAD.encode(k));
                return Ok(Page { page, is_done: false, continue_cursor });
            }
            last_emitted = Some(key.value().to_vec());
            page.push(item);
        }
        last_visited = Some(key.value().to_vec());
    }
    Ok(Page { page, is_done: true, continue_cursor: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::KeyBuf;
    use crate::storage::Storage;
    use crate::table::BLOCK_BY_TIMESTAMP;
    use std::sync::Arc;

    fn seeded(name: &str) -> Arc<Storage> {
        let storage = Storage::temp(name, 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        {
            let mut table = write_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
            for n in 1..=7u64 {
                let key = KeyBuf::new().u64(n * 10).u64(n).build();
                let value = n.to_be_bytes();
                table.insert(key.as_slice(), value.as_slice()).expect("Failed to insert");
            }
        }
        write_tx.commit().expect("Failed to commit");
        storage
    }

    fn number(_key: &[u8], value: &[u8]) -> Result<Option<u64>, AppError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(value);
        Ok(Some(u64::from_be_bytes(buf)))
    }

    #[test]
    fn pages_walk_descending_without_gaps() {
        let storage = seeded("pagination_desc");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");

        let mut seen = Vec::new();
        let mut opts = PaginationOpts::first(3);
        loop {
            let page = scan(&table, &ScanRange::all(), Order::Desc, &opts, number).expect("Failed to scan");
            seen.extend(page.page.iter().copied());
            if page.is_done {
                assert!(page.continue_cursor.is_none());
                break;
            }
            opts = PaginationOpts::new(3, page.continue_cursor);
        }
        assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn exact_fit_reports_done() {
        let storage = seeded("pagination_exact");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let page = scan(&table, &ScanRange::all(), Order::Asc, &PaginationOpts::first(7), number).expect("Failed to scan");
        assert_eq!(page.len(), 7);
        assert!(page.is_done);
    }

    #[test]
    fn floor_limits_the_scan() {
        let storage = seeded("pagination_floor");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let range = ScanRange::all().from(KeyBuf::new().u64(50).build());
        let items = take(&table, &range, Order::Asc, 100, number).expect("Failed to scan");
        assert_eq!(items, vec![5, 6, 7]);
    }

    #[test]
    fn zero_items_is_clamped_to_one() {
        let storage = seeded("pagination_zero");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let page = scan(&table, &ScanRange::all(), Order::Desc, &PaginationOpts::first(0), number).expect("Failed to scan");
        assert_eq!(page.page, vec![7]);
        assert!(!page.is_done);
    }

    #[test]
    fn malformed_cursor_is_rejected() {
        let storage = seeded("pagination_bad_cursor");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let opts = PaginationOpts::new(3, Some("not base64 !!".to_string()));
        let err = scan(&table, &ScanRange::all(), Order::Desc, &opts, number).expect_err("Cursor should be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    fn even(key: &[u8], value: &[u8]) -> Result<Option<u64>, AppError> {
        Ok(number(key, value)?.filter(|n| n % 2 == 0))
    }

    #[test]
    fn visit_budget_cuts_filtered_pages_and_resumes() {
        let storage = seeded("pagination_budget");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");

        // limit 1 gives a budget of 2 visited entries: 1 rejected, 2 accepted
        let first = scan_within(&table, &ScanRange::all(), Order::Asc, &PaginationOpts::first(1), 2, even).expect("Failed to scan");
        assert_eq!(first.page, vec![2]);
        assert!(!first.is_done);

        let mut seen = first.page.clone();
        let mut opts = PaginationOpts::new(1, first.continue_cursor);
        loop {
            let page = scan_within(&table, &ScanRange::all(), Order::Asc, &opts, 2, even).expect("Failed to scan");
            seen.extend(page.page.iter().copied());
            if page.is_done {
                break;
            }
            assert!(page.continue_cursor.is_some());
            opts = PaginationOpts::new(1, page.continue_cursor);
        }
        assert_eq!(seen, vec![2, 4, 6]);
    }

    #[test]
    fn exhausted_budget_with_nothing_accepted_is_not_done() {
        let storage = seeded("pagination_budget_empty");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let reject_all = |_: &[u8], _: &[u8]| -> Result<Option<u64>, AppError> { Ok(None) };

        let page = scan_within(&table, &ScanRange::all(), Order::Desc, &PaginationOpts::first(1), 3, reject_all).expect("Failed to scan");
        assert!(page.is_empty());
        assert!(!page.is_done);
        // resumes below the third newest entry
        let resumed = scan_within(&table, &ScanRange::all(), Order::Desc, &PaginationOpts::new(1, page.continue_cursor), 3, number)
            .expect("Failed to scan");
        assert_eq!(resumed.page, vec![4]);
    }

    #[test]
    fn cursor_below_a_moved_floor_ends_the_walk() {
        let storage = seeded("pagination_moved_floor");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");

        let first = scan(&table, &ScanRange::all().from(KeyBuf::new().u64(15).build()), Order::Desc, &PaginationOpts::first(2), number)
            .expect("Failed to scan");
        assert_eq!(first.page, vec![7, 6]);

        let moved = ScanRange::all().from(KeyBuf::new().u64(65).build());
        let next = scan(&table, &moved, Order::Desc, &PaginationOpts::new(2, first.continue_cursor.clone()), number)
            .expect("Stale cursor should not be rejected");
        assert!(next.is_empty());
        assert!(next.is_done);

        let stale_asc = PaginationOpts::new(2, Some(URL_SAFE_NO_PAD.encode(KeyBuf::new().u64(10).u64(1).build())));
        let ascending = scan(&table, &moved, Order::Asc, &stale_asc, number).expect("Stale cursor should not be rejected");
        assert_eq!(ascending.page, vec![7]);
    }

    #[test]
    fn cursor_from_another_prefix_is_rejected() {
        let storage = seeded("pagination_foreign_cursor");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let table = read_tx.open_table(BLOCK_BY_TIMESTAMP).expect("Failed to open table");
        let foreign = URL_SAFE_NO_PAD.encode(b"zzz");
        let range = ScanRange::prefix(KeyBuf::new().u64(10).build());
        let err = scan(&table, &range, Order::Asc, &PaginationOpts::new(3, Some(foreign)), number).expect_err("Cursor should be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
