//! Free-text search fanned out over transactions, addresses and tokens.
//!
//! Every collection in scope is searched independently inside the same read transaction and
//! reported under its own key, results are never merged or ranked against each other.

use crate::entity::token::TokenFilter;
use crate::model::{Address, Token, TokenType, Transaction};
use crate::pagination::{Page, PaginationOpts};
use crate::{warn, AppError};
use redb::ReadTransaction;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

pub const SEARCH_DEFAULT_LIMIT: usize = 10;
pub const SEARCH_MAX_LIMIT: usize = 50;
/// Shorter queries are answered with empty pages without touching the indexes.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    Transactions,
    Addresses,
    Tokens,
}

impl SearchScope {
    fn includes(&self, other: SearchScope) -> bool {
        *self == SearchScope::All || *self == other
    }
}

impl FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SearchScope::All),
            "transactions" => Ok(SearchScope::Transactions),
            "addresses" => Ok(SearchScope::Addresses),
            "tokens" => Ok(SearchScope::Tokens),
            _ => Err(format!("Invalid search type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub scope: SearchScope,
    pub limit: usize,
    pub contracts_only: bool,
    pub token_type: Option<TokenType>,
    pub verified_only: bool,
}

impl SearchRequest {
    pub fn new(query: &str, scope: SearchScope, limit: usize) -> Self {
        SearchRequest { query: query.to_string(), scope, limit, ..Default::default() }
    }

    fn opts(&self) -> PaginationOpts {
        PaginationOpts::first(self.limit.clamp(1, SEARCH_MAX_LIMIT))
    }
}

/// A collection's result: its page, or the reason that collection failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome<T> {
    Found(Page<T>),
    Failed { error: String },
}

impl<T> SearchOutcome<T> {
    fn from_result(collection: &str, result: Result<Page<T>, AppError>) -> Self {
        match result {
            Ok(page) => SearchOutcome::Found(page),
            Err(e) => {
                warn!("Search over {} failed: {}", collection, e);
                SearchOutcome::Failed { error: e.to_string() }
            }
        }
    }

    pub fn page(&self) -> Option<&Page<T>> {
        match self {
            SearchOutcome::Found(page) => Some(page),
            SearchOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub transactions: Option<SearchOutcome<Transaction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub addresses: Option<SearchOutcome<Address>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub tokens: Option<SearchOutcome<Token>>,
}

pub fn search(tx: &ReadTransaction, request: &SearchRequest) -> SearchResults {
    let query = request.query.trim();
    let scope = request.scope;
    let opts = request.opts();

    if query.chars().count() < MIN_QUERY_CHARS {
        return SearchResults {
            transactions: scope.includes(SearchScope::Transactions).then(|| SearchOutcome::Found(Page::empty())),
            addresses: scope.includes(SearchScope::Addresses).then(|| SearchOutcome::Found(Page::empty())),
            tokens: scope.includes(SearchScope::Tokens).then(|| SearchOutcome::Found(Page::empty())),
        };
    }

    let token_filter = TokenFilter { token_type: request.token_type, verified_only: request.verified_only };
    SearchResults {
        transactions: scope
            .includes(SearchScope::Transactions)
            .then(|| SearchOutcome::from_result("transactions", Transaction::search(tx, query, &opts))),
        addresses: scope
            .includes(SearchScope::Addresses)
            .then(|| SearchOutcome::from_result("addresses", Address::search(tx, query, request.contracts_only, &opts))),
        tokens: scope
            .includes(SearchScope::Tokens)
            .then(|| SearchOutcome::from_result("tokens", Token::search(tx, query, token_filter, &opts))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn seeded(name: &str) -> std::sync::Arc<Storage> {
        let storage = Storage::temp(name, 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        Transaction::store(&write_tx, &Transaction::sample("0xabc001", "0xabc100", None, 1)).expect("Failed to store transaction");
        Address::upsert(&write_tx, &Address::sample("0xabc100", "5")).expect("Failed to upsert address");
        Token::store(&write_tx, &Token::sample("0xabc200", "Abc Coin", TokenType::Erc20, 3)).expect("Failed to store token");
        write_tx.commit().expect("Failed to commit");
        storage
    }

    #[test]
    fn scope_selects_exactly_the_requested_keys() {
        let storage = seeded("search_scope");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");

        let tokens_only = search(&read_tx, &SearchRequest::new("abc", SearchScope::Tokens, 10));
        assert!(tokens_only.transactions.is_none());
        assert!(tokens_only.addresses.is_none());
        assert_eq!(tokens_only.tokens.as_ref().and_then(|o| o.page()).map(|p| p.len()), Some(1));

        let all = search(&read_tx, &SearchRequest::new("0xabc", SearchScope::All, 10));
        assert_eq!(all.transactions.as_ref().and_then(|o| o.page()).map(|p| p.len()), Some(1));
        assert_eq!(all.addresses.as_ref().and_then(|o| o.page()).map(|p| p.len()), Some(1));
        assert!(all.tokens.is_some());
    }

    #[test]
    fn short_queries_yield_empty_done_pages() {
        let storage = seeded("search_short");
        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let results = search(&read_tx, &SearchRequest::new(" 0x ", SearchScope::All, 10));
        for page in [
            results.transactions.as_ref().and_then(|o| o.page()).map(|p| (p.len(), p.is_done)),
            results.addresses.as_ref().and_then(|o| o.page()).map(|p| (p.len(), p.is_done)),
            results.tokens.as_ref().and_then(|o| o.page()).map(|p| (p.len(), p.is_done)),
        ] {
            assert_eq!(page, Some((0, true)));
        }
    }

    #[test]
    fn failures_serialize_under_the_collection_key() {
        let results = SearchResults {
            transactions: Some(SearchOutcome::from_result("transactions", Err(AppError::Custom("index closed".into())))),
            ..Default::default()
        };
        let json = serde_json::to_value(&results).expect("Failed to serialize");
        assert_eq!(json["transactions"]["error"], "Custom error: index closed");
        assert!(json.get("tokens").is_none());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(SearchRequest::new("abc", SearchScope::All, 500).opts().num_items, SEARCH_MAX_LIMIT);
        assert_eq!(SearchRequest::new("abc", SearchScope::All, 0).opts().num_items, 1);
    }
}
