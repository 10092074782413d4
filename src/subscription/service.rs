use tracing::{debug, info, warn};

use crate::model::{
    Subscription, SubscriptionList, SubscriptionRequest, SubscriptionStatus,
};
use crate::pattern::PatternCache;
use crate::persistence::Persistence;
use crate::subscription::validation::validate_request;
use crate::utils::error::{StoreError, SubscriptionError};

#[derive(Debug)]
pub struct SubscriptionService {
    persistence: Persistence,
    patterns: PatternCache,
}

impl SubscriptionService {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            persistence,
            patterns: PatternCache::new(),
        }
    }

    /// Validates and stores a new active subscription.
    ///
    /// Rejects invalid fields, misplaced `#` wildcards, and a second
    /// subscription for the same webhook URL and topic regardless of the
    /// event name.
    pub fn create(&self, request: SubscriptionRequest) -> Result<Subscription, SubscriptionError> {
        info!(
            squad = %request.squad_name,
            topic = %request.topic,
            event = %request.event_name,
            "Creating subscription"
        );

        if let Err(e) = validate_request(&request) {
            warn!(error = %e, "Rejected subscription request");
            return Err(e.into());
        }

        if self
            .persistence
            .subscription_pair_exists(&request.webhook_url, &request.topic)?
        {
            warn!(webhook_url = %request.webhook_url, topic = %request.topic, "Duplicate subscription");
            return Err(SubscriptionError::Duplicate);
        }

        let subscription = Subscription::from_request(request);
        self.persistence.insert_subscription(&subscription)?;
        info!(subscription_id = %subscription.id, "Subscription created");
        Ok(subscription)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        debug!(subscription_id = id, "Looking up subscription");
        self.persistence.find_subscription(id)
    }

    pub fn find_active(&self) -> Result<Vec<Subscription>, StoreError> {
        self.persistence
            .subscriptions_by_status(SubscriptionStatus::Active)
    }

    pub fn find_by_squad(&self, squad_name: &str) -> Result<Vec<Subscription>, StoreError> {
        self.persistence.subscriptions_by_squad(squad_name)
    }

    /// Active subscriptions whose topic pattern matches `topic` and whose event
    /// pattern matches `event_name`.
    pub fn find_matching(&self, topic: &str, event_name: &str) -> Result<Vec<Subscription>, StoreError> {
        let mut active = self.find_active()?;
        active.retain(|s| {
            self.patterns.matches(&s.topic, topic) && self.patterns.matches(&s.event_name, event_name)
        });
        debug!(topic, event_name, matched = active.len(), "Matched subscriptions");
        Ok(active)
    }

    /// Returns `false` when the subscription does not exist.
    pub fn update_status(&self, id: &str, status: SubscriptionStatus) -> Result<bool, StoreError> {
        let updated = self.persistence.update_subscription(id, |s| {
            s.status = status;
            s.updated_at = chrono::Utc::now();
        })?;
        match updated {
            Some(_) => {
                info!(subscription_id = id, status = ?status, "Subscription status updated");
                Ok(true)
            }
            None => {
                warn!(subscription_id = id, "Subscription not found");
                Ok(false)
            }
        }
    }

    /// Returns `false` when the subscription does not exist.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let existing = self.persistence.find_subscription(id)?;
        let deleted = self.persistence.delete_subscription(id)?;
        if deleted {
            if let Some(sub) = existing {
                self.patterns.evict(&sub.topic);
                self.patterns.evict(&sub.event_name);
            }
            info!(subscription_id = id, "Subscription deleted");
        } else {
            warn!(subscription_id = id, "Subscription not found for deletion");
        }
        Ok(deleted)
    }

    pub(crate) fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn count_active_by_squad(&self, squad_name: &str) -> Result<usize, StoreError> {
        self.persistence
            .count_subscriptions(squad_name, SubscriptionStatus::Active)
    }

    /// Summary of the subscribed events, built from the active subscriptions.
    pub fn list_summary(&self) -> Result<SubscriptionList, StoreError> {
        let active = self.find_active()?;
        Ok(SubscriptionList {
            total_subscriptions: active.len(),
            active_subscriptions: active.iter().filter(|s| s.is_active()).count(),
            events: active.iter().map(Subscription::summary).collect(),
        })
    }

    pub fn record_delivery_success(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        self.persistence.update_subscription(id, Subscription::record_success)
    }

    pub fn record_delivery_failure(
        &self,
        id: &str,
        error: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        self.persistence
            .update_subscription(id, |s| s.record_failure(error))
    }
}
