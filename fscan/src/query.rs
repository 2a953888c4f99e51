//! Query-string parameters. Numeric and enum values arrive as raw strings and fall back to their
//! defaults when they do not parse, only a malformed cursor is rejected later on.

use crate::merge::AddressTxFilter;
use crate::model::TokenType;
use crate::pagination::PaginationOpts;
use crate::search::{SearchRequest, SearchScope, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::IntoParams;

pub const LIST_DEFAULT_LIMIT: usize = 20;
pub const LIST_MAX_LIMIT: usize = 100;
pub const DEFAULT_WINDOW_HOURS: u64 = 24;

/// Parses a positive number, zero and garbage fall back to `default`, the result never exceeds `max`.
pub fn lenient_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
    let parsed = raw.and_then(|s| s.trim().parse::<usize>().ok()).filter(|n| *n > 0);
    parsed.unwrap_or(default).min(max)
}

fn lenient_flag(raw: Option<&str>) -> bool {
    matches!(raw.map(|s| s.trim().to_lowercase()).as_deref(), Some("true") | Some("1") | Some("yes"))
}

fn lenient<T: FromStr + Default>(raw: Option<&str>) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[param(example = "20")]
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl PageQuery {
    pub fn opts(&self) -> PaginationOpts {
        PaginationOpts::new(lenient_limit(self.limit.as_deref(), LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT), self.cursor.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressTxQuery {
    #[param(example = "20")]
    pub limit: Option<String>,
    pub cursor: Option<String>,
    /// `outgoing` (alias `from`), `incoming` (alias `to`) or `all`.
    #[param(example = "all")]
    pub direction: Option<String>,
}

impl AddressTxQuery {
    pub fn opts(&self) -> PaginationOpts {
        PaginationOpts::new(lenient_limit(self.limit.as_deref(), LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT), self.cursor.clone())
    }

    pub fn filter(&self) -> AddressTxFilter {
        lenient(self.direction.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokensQuery {
    #[param(example = "ERC20")]
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl TokensQuery {
    pub fn token_type(&self) -> Option<TokenType> {
        self.token_type.as_deref().and_then(|s| TokenType::from_str(s.trim()).ok())
    }

    pub fn opts(&self) -> PaginationOpts {
        PaginationOpts::new(lenient_limit(self.limit.as_deref(), LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT), self.cursor.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HoursQuery {
    #[param(example = "24")]
    pub hours: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl HoursQuery {
    pub fn hours(&self) -> u64 {
        self.hours.as_deref().and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(DEFAULT_WINDOW_HOURS)
    }

    pub fn opts(&self) -> PaginationOpts {
        PaginationOpts::new(lenient_limit(self.limit.as_deref(), LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT), self.cursor.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[param(example = "0xabc")]
    pub q: Option<String>,
    /// `all`, `transactions`, `addresses` or `tokens`.
    #[serde(rename = "type")]
    pub scope: Option<String>,
    pub limit: Option<String>,
    pub contracts_only: Option<String>,
    pub token_type: Option<String>,
    pub verified_only: Option<String>,
}

impl SearchQuery {
    pub fn request(&self) -> SearchRequest {
        SearchRequest {
            query: self.q.clone().unwrap_or_default(),
            scope: lenient::<SearchScope>(self.scope.as_deref()),
            limit: lenient_limit(self.limit.as_deref(), SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT),
            contracts_only: lenient_flag(self.contracts_only.as_deref()),
            token_type: self.token_type.as_deref().and_then(|s| TokenType::from_str(s.trim()).ok()),
            verified_only: lenient_flag(self.verified_only.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnnotationQuery {
    pub target: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_fall_back_and_clamp() {
        assert_eq!(lenient_limit(None, 20, 100), 20);
        assert_eq!(lenient_limit(Some("abc"), 20, 100), 20);
        assert_eq!(lenient_limit(Some("0"), 20, 100), 20);
        assert_eq!(lenient_limit(Some("-5"), 20, 100), 20);
        assert_eq!(lenient_limit(Some("500"), 20, 100), 100);
        assert_eq!(lenient_limit(Some(" 7 "), 20, 100), 7);
    }

    #[test]
    fn unknown_direction_and_scope_mean_all() {
        let query = AddressTxQuery { direction: Some("sideways".into()), ..Default::default() };
        assert_eq!(query.filter(), AddressTxFilter::All);
        let query = AddressTxQuery { direction: Some("to".into()), ..Default::default() };
        assert_eq!(query.filter(), AddressTxFilter::Incoming);

        let search = SearchQuery { q: Some("abc".into()), scope: Some("everything".into()), ..Default::default() };
        assert_eq!(search.request().scope, SearchScope::All);
    }

    #[test]
    fn search_query_reads_filters() {
        let search = SearchQuery {
            q: Some("uni".into()),
            scope: Some("tokens".into()),
            limit: Some("80".into()),
            contracts_only: None,
            token_type: Some("erc721".into()),
            verified_only: Some("true".into()),
        };
        let request = search.request();
        assert_eq!(request.scope, SearchScope::Tokens);
        assert_eq!(request.limit, SEARCH_MAX_LIMIT);
        assert_eq!(request.token_type, Some(TokenType::Erc721));
        assert!(request.verified_only);
        assert!(!request.contracts_only);
    }

    #[test]
    fn hours_default_to_a_day() {
        assert_eq!(HoursQuery::default().hours(), DEFAULT_WINDOW_HOURS);
        assert_eq!(HoursQuery { hours: Some("x".into()), ..Default::default() }.hours(), DEFAULT_WINDOW_HOURS);
        assert_eq!(HoursQuery { hours: Some("6".into()), ..Default::default() }.hours(), 6);
    }
}
