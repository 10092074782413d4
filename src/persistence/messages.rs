use sled::Transactional;
use sled::transaction::TransactionResult;

use crate::model::{MessageLogEntry, MessageStatus, PayloadRecord};
use crate::persistence::sled_store::{decode, encode, from_transaction, scan, update_row};
use crate::persistence::Persistence;
use crate::utils::error::StoreError;

impl Persistence {
    pub fn message_exists(&self, message_id: &str) -> Result<bool, StoreError> {
        Ok(self.message_log.contains_key(message_id)?)
    }

    pub fn find_message(&self, message_id: &str) -> Result<Option<MessageLogEntry>, StoreError> {
        self.message_log
            .get(message_id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn find_payload(&self, message_id: &str) -> Result<Option<PayloadRecord>, StoreError> {
        self.payloads
            .get(message_id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Stores a new log entry and its payload atomically. Returns `false`
    /// without writing anything when the message id is already logged.
    pub fn insert_message(
        &self,
        entry: &MessageLogEntry,
        payload: &PayloadRecord,
    ) -> Result<bool, StoreError> {
        let key = entry.message_id.as_bytes();
        let entry_bytes = encode(entry)?;
        let payload_bytes = encode(payload)?;

        let outcome: TransactionResult<bool, StoreError> = (&self.message_log, &self.payloads)
            .transaction(|(log, payloads)| {
                if log.get(key)?.is_some() {
                    return Ok(false);
                }
                log.insert(key, entry_bytes.clone())?;
                payloads.insert(key, payload_bytes.clone())?;
                Ok(true)
            });
        outcome.map_err(from_transaction)
    }

    pub fn update_message<F>(
        &self,
        message_id: &str,
        apply: F,
    ) -> Result<Option<MessageLogEntry>, StoreError>
    where
        F: FnMut(&mut MessageLogEntry),
    {
        update_row(&self.message_log, message_id, apply)
    }

    pub fn messages_by_status(&self, status: MessageStatus) -> Result<Vec<MessageLogEntry>, StoreError> {
        let mut entries: Vec<MessageLogEntry> = scan(&self.message_log)?;
        entries.retain(|e| e.status == status);
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub fn count_messages(&self) -> usize {
        self.message_log.len()
    }
}
