use crate::codec::{words, KeyBuf};
use crate::model::{Token, TokenType};
use crate::pagination::{scan, Order, Page, PaginationOpts, ScanRange};
use crate::table::{get_record, put_raw, put_record, remove, SEARCH_TOKEN_NAME, TOKENS, TOKEN_BY_HOLDERS, TOKEN_BY_TYPE};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};

/// Token search narrowing, both filters are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenFilter {
    pub token_type: Option<TokenType>,
    pub verified_only: bool,
}

impl TokenFilter {
    fn accepts(&self, token: &Token) -> bool {
        self.token_type.map_or(true, |t| t == token.token_type) && (!self.verified_only || token.verified)
    }
}

impl Token {
    pub fn pk(address: &str) -> Vec<u8> {
        KeyBuf::new().text(address).build()
    }

    fn holders_key(&self) -> Vec<u8> {
        KeyBuf::new().u64(self.holders).text(&self.address).build()
    }

    fn type_key(&self) -> Vec<u8> {
        KeyBuf::new().str(self.token_type.as_str()).u64(self.holders).text(&self.address).build()
    }

    fn name_keys(&self) -> Vec<Vec<u8>> {
        words(&self.name).iter().map(|w| KeyBuf::new().str(w).text(&self.address).build()).collect()
    }

    pub fn get(tx: &ReadTransaction, address: &str) -> Result<Option<Token>, AppError> {
        let tokens = tx.open_table(TOKENS)?;
        get_record(&tokens, &Token::pk(address))
    }

    /// Tokens with the most holders first, optionally of a single type.
    pub fn top(tx: &ReadTransaction, token_type: Option<TokenType>, opts: &PaginationOpts) -> Result<Page<Token>, AppError> {
        let tokens = tx.open_table(TOKENS)?;
        match token_type {
            Some(t) => {
                let by_type = tx.open_table(TOKEN_BY_TYPE)?;
                let range = ScanRange::prefix(KeyBuf::new().str(t.as_str()).build());
                scan(&by_type, &range, Order::Desc, opts, |_, pk| get_record(&tokens, pk))
            }
            None => {
                let by_holders = tx.open_table(TOKEN_BY_HOLDERS)?;
                scan(&by_holders, &ScanRange::all(), Order::Desc, opts, |_, pk| get_record(&tokens, pk))
            }
        }
    }

    /// Tokens whose name has, for every query word, a word starting with it.
    ///
    /// The first query word drives the index scan. A token is emitted only from the entry of its
    /// first name word matching that query word, so a name with several matching words is never
    /// returned twice across pages.
    pub fn search(tx: &ReadTransaction, query: &str, filter: TokenFilter, opts: &PaginationOpts) -> Result<Page<Token>, AppError> {
        let query_words = words(query);
        let Some(driver) = query_words.first() else {
            return Ok(Page::empty());
        };
        let names = tx.open_table(SEARCH_TOKEN_NAME)?;
        let tokens = tx.open_table(TOKENS)?;
        let range = ScanRange::prefix(KeyBuf::new().text(driver).build());
        scan(&names, &range, Order::Asc, opts, |key, pk| {
            let Some(token) = get_record::<Token>(&tokens, pk)? else {
                return Ok(None);
            };
            let name_words = words(&token.name);
            let emitting_word = name_words.iter().find(|w| w.starts_with(driver.as_str()));
            let emitted_here = emitting_word.is_some_and(|w| key.starts_with(KeyBuf::new().str(w).build().as_slice()));
            let all_match = query_words.iter().all(|q| name_words.iter().any(|w| w.starts_with(q.as_str())));
            Ok((emitted_here && all_match && filter.accepts(&token)).then_some(token))
        })
    }

    /// Writes the token under its address, replacing the index entries of a previous version.
    pub fn store(write_tx: &WriteTransaction, token: &Token) -> Result<(), AppError> {
        let pk = Token::pk(&token.address);
        let mut tokens = write_tx.open_table(TOKENS)?;
        let mut by_holders = write_tx.open_table(TOKEN_BY_HOLDERS)?;
        let mut by_type = write_tx.open_table(TOKEN_BY_TYPE)?;
        let mut names = write_tx.open_table(SEARCH_TOKEN_NAME)?;

        if let Some(previous) = get_record::<Token>(&tokens, &pk)? {
            remove(&mut by_holders, &previous.holders_key())?;
            remove(&mut by_type, &previous.type_key())?;
            for key in previous.name_keys() {
                remove(&mut names, &key)?;
            }
        }
        put_record(&mut tokens, &pk, token)?;
        put_raw(&mut by_holders, &token.holders_key(), &pk)?;
        put_raw(&mut by_type, &token.type_key(), &pk)?;
        for key in token.name_keys() {
            put_raw(&mut names, &key, &pk)?;
        }
        Ok(())
    }

    pub fn sample(address: &str, name: &str, token_type: TokenType, holders: u64) -> Token {
        Token {
            address: address.to_string(),
            name: name.to_string(),
            symbol: name.split_whitespace().filter_map(|w| w.chars().next()).collect::<String>().to_uppercase(),
            decimals: 18,
            total_supply: "1000000000000000000000000".to_string(),
            contract_address: Some(address.to_string()),
            token_type,
            holders,
            transfers: 0,
            verified: false,
            logo: None,
            website: None,
            description: None,
        }
    }
}
