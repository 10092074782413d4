#[cfg(test)]
mod persistence_tests {
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::{Map, json};
    use tempfile::{TempDir, tempdir};

    use crate::model::{
        MessageLogEntry, MessageStatus, PayloadRecord, Subscription, SubscriptionRequest,
        SubscriptionStatus,
    };
    use crate::persistence::Persistence;
    use crate::utils::error::StoreError;

    fn create_test_persistence() -> (Persistence, TempDir) {
        let dir = tempdir().unwrap();
        let persistence = Persistence::open(dir.path()).unwrap();
        (persistence, dir)
    }

    fn log_entry(id: &str) -> (MessageLogEntry, PayloadRecord) {
        let entry = MessageLogEntry::publishing(id, "a.b.c", "a.b.c", None, Utc::now());
        let mut payload = Map::new();
        payload.insert("orderId".to_string(), json!(7));
        let record = PayloadRecord {
            message_id: id.to_string(),
            payload,
            schema_version: None,
            created_at: Utc::now(),
        };
        (entry, record)
    }

    fn subscription(url: &str, topic: &str, squad: &str) -> Subscription {
        Subscription::from_request(SubscriptionRequest {
            webhook_url: url.to_string(),
            squad_name: squad.to_string(),
            topic: topic.to_string(),
            event_name: "orderCreated".to_string(),
        })
    }

    #[test]
    fn test_insert_and_find_message_with_payload() {
        let (persistence, _dir) = create_test_persistence();
        let (entry, payload) = log_entry("m-1");

        assert!(persistence.insert_message(&entry, &payload).unwrap());
        assert!(persistence.message_exists("m-1").unwrap());
        assert_eq!(persistence.find_message("m-1").unwrap(), Some(entry));
        assert_eq!(persistence.find_payload("m-1").unwrap(), Some(payload));
    }

    #[test]
    fn test_second_insert_for_same_id_is_refused() {
        let (persistence, _dir) = create_test_persistence();
        let (entry, payload) = log_entry("m-1");
        assert!(persistence.insert_message(&entry, &payload).unwrap());

        let (mut other, mut other_payload) = log_entry("m-1");
        other.channel = "x.y".to_string();
        other_payload.schema_version = Some("2".to_string());
        assert!(!persistence.insert_message(&other, &other_payload).unwrap());

        assert_eq!(persistence.find_message("m-1").unwrap().unwrap().channel, "a.b.c");
        assert!(persistence.find_payload("m-1").unwrap().unwrap().schema_version.is_none());
        assert_eq!(persistence.count_messages(), 1);
    }

    #[test]
    fn test_update_message_status() {
        let (persistence, _dir) = create_test_persistence();
        let (entry, payload) = log_entry("m-1");
        persistence.insert_message(&entry, &payload).unwrap();

        let updated = persistence
            .update_message("m-1", |e| e.mark_published())
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, MessageStatus::Published);
        assert_eq!(
            persistence.messages_by_status(MessageStatus::Published).unwrap().len(),
            1
        );
        assert!(persistence.update_message("missing", |e| e.mark_published()).unwrap().is_none());
    }

    #[test]
    fn test_subscription_crud() {
        let (persistence, _dir) = create_test_persistence();
        let sub = subscription("https://a.example.com/hook", "payments.*", "payments");
        persistence.insert_subscription(&sub).unwrap();

        assert!(persistence.subscription_exists(&sub.id).unwrap());
        assert_eq!(persistence.find_subscription(&sub.id).unwrap(), Some(sub.clone()));
        assert!(persistence
            .subscription_pair_exists("https://a.example.com/hook", "payments.*")
            .unwrap());

        let updated = persistence
            .update_subscription(&sub.id, |s| s.status = SubscriptionStatus::Inactive)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Inactive);

        assert!(persistence.delete_subscription(&sub.id).unwrap());
        assert!(!persistence.delete_subscription(&sub.id).unwrap());
        assert!(persistence.find_subscription(&sub.id).unwrap().is_none());
        assert!(!persistence
            .subscription_pair_exists("https://a.example.com/hook", "payments.*")
            .unwrap());
    }

    #[test]
    fn test_duplicate_pair_is_rejected() {
        let (persistence, _dir) = create_test_persistence();
        let first = subscription("https://a.example.com/hook", "payments.*", "payments");
        let mut second = subscription("https://a.example.com/hook", "payments.*", "other");
        second.event_name = "orderCanceled".to_string();

        persistence.insert_subscription(&first).unwrap();
        assert!(matches!(
            persistence.insert_subscription(&second),
            Err(StoreError::DuplicateSubscription)
        ));
        assert!(persistence.find_subscription(&second.id).unwrap().is_none());
    }

    #[test]
    fn test_pair_is_free_again_after_delete() {
        let (persistence, _dir) = create_test_persistence();
        let first = subscription("https://a.example.com/hook", "payments.*", "payments");
        persistence.insert_subscription(&first).unwrap();
        persistence.delete_subscription(&first.id).unwrap();

        let again = subscription("https://a.example.com/hook", "payments.*", "payments");
        assert!(persistence.insert_subscription(&again).is_ok());
    }

    #[test]
    fn test_subscription_queries() {
        let (persistence, _dir) = create_test_persistence();
        let a = subscription("https://a.example.com/hook", "payments.*", "payments");
        let b = subscription("https://b.example.com/hook", "payments.*", "payments");
        let c = subscription("https://c.example.com/hook", "users.*", "users");
        for s in [&a, &b, &c] {
            persistence.insert_subscription(s).unwrap();
        }
        persistence
            .update_subscription(&b.id, |s| s.status = SubscriptionStatus::Suspended)
            .unwrap();

        assert_eq!(persistence.subscriptions().unwrap().len(), 3);
        assert_eq!(persistence.subscriptions_by_squad("payments").unwrap().len(), 2);
        assert_eq!(
            persistence
                .subscriptions_by_status(SubscriptionStatus::Active)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            persistence
                .count_subscriptions("payments", SubscriptionStatus::Active)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_concurrent_row_updates_are_not_lost() {
        let (persistence, _dir) = create_test_persistence();
        let sub = subscription("https://a.example.com/hook", "payments.*", "payments");
        persistence.insert_subscription(&sub).unwrap();

        let persistence = Arc::new(persistence);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let persistence = persistence.clone();
                let id = sub.id.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        persistence
                            .update_subscription(&id, |s| s.record_failure("boom"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored = persistence.find_subscription(&sub.id).unwrap().unwrap();
        assert_eq!(stored.failed_attempts, 200);
    }
}
