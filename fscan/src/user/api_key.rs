use crate::table::{get_raw, put_raw, put_record, API_KEYS, API_KEY_BY_KEY, API_KEY_BY_USER};
use crate::user::{id_key, list_owned, load_owned, next_id, owner_key, Identity, Owned, UserId};
use crate::AppError;
use rand::Rng;
use redb::{ReadTransaction, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const KEY_PREFIX: &str = "fscan_";
const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const KEY_RANDOM_CHARS: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: u64,
    pub user_id: UserId,
    pub key: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub rate_limit: u64,
    pub usage: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewApiKey {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub rate_limit: u64,
}

impl Owned for ApiKey {
    const KIND: &'static str = "API key";
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

fn generate_key() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..KEY_RANDOM_CHARS)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", KEY_PREFIX, suffix)
}

impl ApiKey {
    pub fn list(tx: &ReadTransaction, identity: Option<&Identity>) -> Result<Vec<ApiKey>, AppError> {
        list_owned(tx, API_KEYS, API_KEY_BY_USER, identity)
    }

    /// Issues a fresh, unused and active key with a random unique secret.
    pub fn create(write_tx: &WriteTransaction, identity: Option<&Identity>, new: NewApiKey) -> Result<ApiKey, AppError> {
        let identity = Identity::require(identity)?;
        let mut api_keys = write_tx.open_table(API_KEYS)?;
        let mut by_user = write_tx.open_table(API_KEY_BY_USER)?;
        let mut by_key = write_tx.open_table(API_KEY_BY_KEY)?;

        let mut key = generate_key();
        while get_raw(&by_key, key.as_bytes())?.is_some() {
            key = generate_key();
        }
        let id = next_id(&api_keys)?;
        let api_key = ApiKey {
            id,
            user_id: identity.user_id().clone(),
            key,
            name: new.name,
            permissions: new.permissions,
            rate_limit: new.rate_limit,
            usage: 0,
            active: true,
        };
        put_record(&mut api_keys, &id_key(id), &api_key)?;
        put_raw(&mut by_user, &owner_key(&api_key.user_id, id), &id_key(id))?;
        put_raw(&mut by_key, api_key.key.as_bytes(), &id_key(id))?;
        Ok(api_key)
    }

    pub fn toggle(write_tx: &WriteTransaction, identity: Option<&Identity>, id: u64, active: bool) -> Result<ApiKey, AppError> {
        let identity = Identity::require(identity)?;
        let mut api_keys = write_tx.open_table(API_KEYS)?;
        let mut api_key: ApiKey = load_owned(&api_keys, id, identity)?;
        api_key.active = active;
        put_record(&mut api_keys, &id_key(id), &api_key)?;
        Ok(api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn generated_keys_have_prefix_and_lowercase_suffix() {
        let key = generate_key();
        assert!(key.starts_with(KEY_PREFIX));
        let suffix = &key[KEY_PREFIX.len()..];
        assert_eq!(suffix.len(), KEY_RANDOM_CHARS);
        assert!(suffix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn it_should_issue_and_deactivate_keys() {
        let storage = Storage::temp("api_key_toggle", 8, true).expect("Failed to create storage");
        let alice = Identity::new("alice");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        let new = NewApiKey { name: "indexer".to_string(), permissions: vec!["read".to_string()], rate_limit: 100 };
        let first = ApiKey::create(&write_tx, Some(&alice), new.clone()).expect("Failed to create key");
        let second = ApiKey::create(&write_tx, Some(&alice), new).expect("Failed to create key");
        assert_ne!(first.key, second.key);
        assert_ne!(first.id, second.id);
        assert_eq!(first.usage, 0);
        assert!(first.active);

        let denied = ApiKey::toggle(&write_tx, Some(&Identity::new("bob")), first.id, false).expect_err("Foreign toggle should fail");
        assert_eq!(denied.to_string(), "API key not found or access denied");
        let toggled = ApiKey::toggle(&write_tx, Some(&alice), first.id, false).expect("Failed to toggle key");
        assert!(!toggled.active);
        write_tx.commit().expect("Failed to commit");

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        assert_eq!(ApiKey::list(&read_tx, Some(&alice)).expect("Failed to list keys").len(), 2);
        assert!(ApiKey::list(&read_tx, Some(&Identity::new("bob"))).expect("Failed to list keys").is_empty());
    }
}
