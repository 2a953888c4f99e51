use crate::table::{put_raw, put_record, ALERTS, ALERT_BY_USER};
use crate::user::{id_key, list_owned, load_owned, next_id, owner_key, Identity, Owned, UserId};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Address,
    Transaction,
    Token,
    Whale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: u64,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub target: String,
    pub condition: String,
    pub threshold: Option<String>,
    pub active: bool,
    pub triggered: u64,
    pub last_triggered: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub target: String,
    pub condition: String,
    #[serde(default)]
    pub threshold: Option<String>,
}

impl Owned for Alert {
    const KIND: &'static str = "Alert";
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

impl Alert {
    pub fn list(tx: &ReadTransaction, identity: Option<&Identity>) -> Result<Vec<Alert>, AppError> {
        list_owned(tx, ALERTS, ALERT_BY_USER, identity)
    }

    /// New alerts start active and never triggered.
    pub fn create(write_tx: &WriteTransaction, identity: Option<&Identity>, new: NewAlert) -> Result<Alert, AppError> {
        let identity = Identity::require(identity)?;
        let mut alerts = write_tx.open_table(ALERTS)?;
        let mut by_user = write_tx.open_table(ALERT_BY_USER)?;
        let id = next_id(&alerts)?;
        let alert = Alert {
            id,
            user_id: identity.user_id().clone(),
            kind: new.kind,
            target: new.target,
            condition: new.condition,
            threshold: new.threshold,
            active: true,
            triggered: 0,
            last_triggered: None,
        };
        put_record(&mut alerts, &id_key(id), &alert)?;
        put_raw(&mut by_user, &owner_key(&alert.user_id, id), &id_key(id))?;
        Ok(alert)
    }

    pub fn toggle(write_tx: &WriteTransaction, identity: Option<&Identity>, id: u64, active: bool) -> Result<Alert, AppError> {
        let identity = Identity::require(identity)?;
        let mut alerts = write_tx.open_table(ALERTS)?;
        let mut alert: Alert = load_owned(&alerts, id, identity)?;
        alert.active = active;
        put_record(&mut alerts, &id_key(id), &alert)?;
        Ok(alert)
    }
}
