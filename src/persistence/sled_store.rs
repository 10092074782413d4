use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::transaction::TransactionError;
use sled::{Db, Tree};
use tracing::info;

use crate::utils::error::StoreError;

const MESSAGE_LOG_TREE: &str = "message_log";
const PAYLOAD_TREE: &str = "payload_store";
const SUBSCRIPTION_TREE: &str = "subscriptions";
const SUBSCRIPTION_KEY_TREE: &str = "subscription_keys";

/// Handle to the hookhub database. Cheap to clone; clones share the database.
#[derive(Clone)]
pub struct Persistence {
    db: Db,
    pub(crate) message_log: Tree,
    pub(crate) payloads: Tree,
    pub(crate) subscriptions: Tree,
    pub(crate) subscription_keys: Tree,
}

impl Persistence {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened database");
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        Ok(Self {
            message_log: db.open_tree(MESSAGE_LOG_TREE)?,
            payloads: db.open_tree(PAYLOAD_TREE)?,
            subscriptions: db.open_tree(SUBSCRIPTION_TREE)?,
            subscription_keys: db.open_tree(SUBSCRIPTION_KEY_TREE)?,
            db,
        })
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("db", &"sled::Db")
            .finish()
    }
}

pub(crate) fn encode<T: Serialize>(row: &T) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(row)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub(crate) fn scan<T: DeserializeOwned>(tree: &Tree) -> Result<Vec<T>, StoreError> {
    tree.iter()
        .values()
        .map(|value| decode(&value?))
        .collect()
}

/// Read-modify-write of one row with optimistic concurrency: the write only
/// lands if the row is unchanged since it was read, otherwise the update is
/// re-applied to the fresh value. `None` when the row does not exist.
pub(crate) fn update_row<T, F>(tree: &Tree, key: &str, mut apply: F) -> Result<Option<T>, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(&mut T),
{
    loop {
        let Some(current) = tree.get(key)? else {
            return Ok(None);
        };
        let mut row: T = decode(&current)?;
        apply(&mut row);
        let next = encode(&row)?;
        if tree.compare_and_swap(key, Some(current), Some(next))?.is_ok() {
            return Ok(Some(row));
        }
    }
}

pub(crate) fn from_transaction(e: TransactionError<StoreError>) -> StoreError {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Sled(e),
    }
}
