use crate::table::{put_raw, put_record, WATCHLISTS, WATCHLIST_BY_USER};
use crate::user::{id_key, list_owned, load_owned, next_id, owner_key, Identity, Owned, UserId};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub id: u64,
    pub user_id: UserId,
    pub name: String,
    pub addresses: Vec<String>,
    pub tokens: Vec<String>,
    pub description: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlist {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
}

/// Partial update, absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistPatch {
    pub name: Option<String>,
    pub addresses: Option<Vec<String>>,
    pub tokens: Option<Vec<String>>,
    pub description: Option<String>,
    pub public: Option<bool>,
}

impl Owned for Watchlist {
    const KIND: &'static str = "Watchlist";
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

impl Watchlist {
    pub fn list(tx: &ReadTransaction, identity: Option<&Identity>) -> Result<Vec<Watchlist>, AppError> {
        list_owned(tx, WATCHLISTS, WATCHLIST_BY_USER, identity)
    }

    pub fn create(write_tx: &WriteTransaction, identity: Option<&Identity>, new: NewWatchlist) -> Result<Watchlist, AppError> {
        let identity = Identity::require(identity)?;
        let mut watchlists = write_tx.open_table(WATCHLISTS)?;
        let mut by_user = write_tx.open_table(WATCHLIST_BY_USER)?;
        let id = next_id(&watchlists)?;
        let watchlist = Watchlist {
            id,
            user_id: identity.user_id().clone(),
            name: new.name,
            addresses: new.addresses,
            tokens: new.tokens,
            description: new.description,
            public: new.public,
        };
        put_record(&mut watchlists, &id_key(id), &watchlist)?;
        put_raw(&mut by_user, &owner_key(&watchlist.user_id, id), &id_key(id))?;
        Ok(watchlist)
    }

    pub fn update(write_tx: &WriteTransaction, identity: Option<&Identity>, id: u64, patch: WatchlistPatch) -> Result<Watchlist, AppError> {
        let identity = Identity::require(identity)?;
        let mut watchlists = write_tx.open_table(WATCHLISTS)?;
        let mut watchlist: Watchlist = load_owned(&watchlists, id, identity)?;
        if let Some(name) = patch.name {
            watchlist.name = name;
        }
        if let Some(addresses) = patch.addresses {
            watchlist.addresses = addresses;
        }
        if let Some(tokens) = patch.tokens {
            watchlist.tokens = tokens;
        }
        if let Some(description) = patch.description {
            watchlist.description = Some(description);
        }
        if let Some(public) = patch.public {
            watchlist.public = public;
        }
        put_record(&mut watchlists, &id_key(id), &watchlist)?;
        Ok(watchlist)
    }
}
