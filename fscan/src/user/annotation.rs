use crate::codec::KeyBuf;
use crate::pagination::{take, Order, ScanRange};
use crate::table::{get_record, put_raw, put_record, ANNOTATIONS, ANNOTATION_BY_TARGET, ANNOTATION_BY_USER};
use crate::user::{id_key, list_owned, next_id, owner_key, Identity, Owned, UserId, USER_LIST_CEILING};
use crate::AppError;
use redb::{ReadTransaction, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Address,
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: u64,
    pub user_id: UserId,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub note: String,
    pub tags: Vec<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnotation {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub public: bool,
}

impl Owned for Annotation {
    const KIND: &'static str = "Annotation";
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

impl Annotation {
    /// With a target, the annotations on it the caller may see: public ones and its own.
    /// Without one, the caller's own annotations.
    pub fn list(tx: &ReadTransaction, identity: Option<&Identity>, target: Option<&str>) -> Result<Vec<Annotation>, AppError> {
        let Some(identity) = identity else {
            return Ok(Vec::new());
        };
        match target {
            Some(target) => {
                let annotations = tx.open_table(ANNOTATIONS)?;
                let by_target = tx.open_table(ANNOTATION_BY_TARGET)?;
                let range = ScanRange::prefix(KeyBuf::new().str(target).build());
                take(&by_target, &range, Order::Asc, USER_LIST_CEILING, |_, pk| {
                    Ok(get_record::<Annotation>(&annotations, pk)?.filter(|a| a.public || a.owner() == identity.user_id()))
                })
            }
            None => list_owned(tx, ANNOTATIONS, ANNOTATION_BY_USER, Some(identity)),
        }
    }

    pub fn create(write_tx: &WriteTransaction, identity: Option<&Identity>, new: NewAnnotation) -> Result<Annotation, AppError> {
        let identity = Identity::require(identity)?;
        let mut annotations = write_tx.open_table(ANNOTATIONS)?;
        let mut by_user = write_tx.open_table(ANNOTATION_BY_USER)?;
        let mut by_target = write_tx.open_table(ANNOTATION_BY_TARGET)?;
        let id = next_id(&annotations)?;
        let annotation = Annotation {
            id,
            user_id: identity.user_id().clone(),
            target: new.target,
            kind: new.kind,
            note: new.note,
            tags: new.tags,
            public: new.public,
        };
        put_record(&mut annotations, &id_key(id), &annotation)?;
        put_raw(&mut by_user, &owner_key(&annotation.user_id, id), &id_key(id))?;
        put_raw(&mut by_target, &KeyBuf::new().str(&annotation.target).u64(id).build(), &id_key(id))?;
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn note(target: &str, public: bool) -> NewAnnotation {
        NewAnnotation { target: target.to_string(), kind: AnnotationKind::Address, note: "hot wallet".to_string(), tags: vec!["cex".to_string()], public }
    }

    #[test]
    fn it_should_list_visible_annotations_on_target() {
        let storage = Storage::temp("annotation_target", 8, true).expect("Failed to create storage");
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        Annotation::create(&write_tx, Some(&alice), note("0xa", false)).expect("Failed to create annotation");
        Annotation::create(&write_tx, Some(&bob), note("0xa", true)).expect("Failed to create annotation");
        Annotation::create(&write_tx, Some(&bob), note("0xa", false)).expect("Failed to create annotation");
        Annotation::create(&write_tx, Some(&bob), note("0xb", true)).expect("Failed to create annotation");
        write_tx.commit().expect("Failed to commit");

        let read_tx = storage.begin_read().expect("Failed to begin read transaction");
        let on_target = Annotation::list(&read_tx, Some(&alice), Some("0xa")).expect("Failed to list annotations");
        let owners: Vec<&str> = on_target.iter().map(|a| a.user_id.as_str()).collect();
        assert_eq!(owners, vec!["alice", "bob"]);

        let own = Annotation::list(&read_tx, Some(&bob), None).expect("Failed to list annotations");
        assert_eq!(own.len(), 3);
        assert!(Annotation::list(&read_tx, None, Some("0xa")).expect("Failed to list annotations").is_empty());
    }

    #[test]
    fn it_should_require_identity_to_annotate() {
        let storage = Storage::temp("annotation_anonymous", 8, true).expect("Failed to create storage");
        let write_tx = storage.begin_write().expect("Failed to begin write transaction");
        let err = Annotation::create(&write_tx, None, note("0xa", true)).expect_err("Anonymous annotation should fail");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
