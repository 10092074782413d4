use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionResult};

use crate::model::{Subscription, SubscriptionStatus};
use crate::persistence::sled_store::{decode, encode, from_transaction, scan, update_row};
use crate::persistence::Persistence;
use crate::utils::error::StoreError;

/// Index key enforcing one subscription per `(webhook_url, topic)`.
fn pair_key(webhook_url: &str, topic: &str) -> String {
    format!("{webhook_url}\u{1f}{topic}")
}

impl Persistence {
    /// Stores a new subscription. Fails with
    /// [`StoreError::DuplicateSubscription`] when its webhook URL and topic
    /// are already taken.
    pub fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let pair = pair_key(&subscription.webhook_url, &subscription.topic);
        let row = encode(subscription)?;
        let id = subscription.id.as_bytes();

        let outcome: TransactionResult<(), StoreError> = (&self.subscriptions, &self.subscription_keys)
            .transaction(|(subscriptions, keys)| {
                if keys.get(pair.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        StoreError::DuplicateSubscription,
                    ));
                }
                keys.insert(pair.as_bytes(), id)?;
                subscriptions.insert(id, row.clone())?;
                Ok(())
            });
        outcome.map_err(from_transaction)
    }

    pub fn subscription_pair_exists(&self, webhook_url: &str, topic: &str) -> Result<bool, StoreError> {
        Ok(self
            .subscription_keys
            .contains_key(pair_key(webhook_url, topic))?)
    }

    pub fn subscription_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.subscriptions.contains_key(id)?)
    }

    pub fn find_subscription(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        self.subscriptions
            .get(id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All subscriptions, oldest first.
    pub fn subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let mut all: Vec<Subscription> = scan(&self.subscriptions)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    pub fn subscriptions_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<Subscription>, StoreError> {
        let mut subs = self.subscriptions()?;
        subs.retain(|s| s.status == status);
        Ok(subs)
    }

    pub fn subscriptions_by_squad(&self, squad_name: &str) -> Result<Vec<Subscription>, StoreError> {
        let mut subs = self.subscriptions()?;
        subs.retain(|s| s.squad_name == squad_name);
        Ok(subs)
    }

    pub fn count_subscriptions(
        &self,
        squad_name: &str,
        status: SubscriptionStatus,
    ) -> Result<usize, StoreError> {
        Ok(self
            .subscriptions()?
            .iter()
            .filter(|s| s.squad_name == squad_name && s.status == status)
            .count())
    }

    pub fn update_subscription<F>(&self, id: &str, apply: F) -> Result<Option<Subscription>, StoreError>
    where
        F: FnMut(&mut Subscription),
    {
        update_row(&self.subscriptions, id, apply)
    }

    /// Removes the subscription and frees its `(webhook_url, topic)` pair.
    /// Returns `false` when no such subscription exists.
    pub fn delete_subscription(&self, id: &str) -> Result<bool, StoreError> {
        let outcome: TransactionResult<bool, StoreError> = (&self.subscriptions, &self.subscription_keys)
            .transaction(|(subscriptions, keys)| {
                let Some(bytes) = subscriptions.remove(id.as_bytes())? else {
                    return Ok(false);
                };
                let subscription: Subscription = serde_json::from_slice(&bytes)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Codec(e)))?;
                keys.remove(pair_key(&subscription.webhook_url, &subscription.topic).as_bytes())?;
                Ok(true)
            });
        outcome.map_err(from_transaction)
    }
}
