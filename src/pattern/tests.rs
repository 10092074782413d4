use super::matcher::{CompiledPattern, PatternCache, matches, validate};
use crate::utils::error::PatternError;

#[test]
fn test_star_matches_trailing_segment() {
    assert!(matches("payments.order.*", "payments.order.created"));
    assert!(!matches("payments.order.*", "payments.refund.created"));
}

#[test]
fn test_hash_on_both_ends() {
    assert!(matches("#.order.#", "x.order.y"));
    assert!(matches("#.order.#", "payments.order.created"));
    assert!(!matches("#.order.#", "payments.refund.created"));
}

#[test]
fn test_exact_patterns() {
    assert!(matches("orderCreated", "orderCreated"));
    assert!(!matches("orderCreated", "orderCanceled"));
}

#[test]
fn test_matching_ignores_case() {
    assert!(matches("ordercreated", "orderCreated"));
    assert!(matches("PAYMENTS.*", "payments.order.created"));
}

#[test]
fn test_star_matches_any_run_not_a_single_character() {
    // `*` spans several characters and segment separators, exactly like `#`
    assert!(matches("pay*", "payments.order.created"));
    assert!(matches("payments.*.created", "payments.order.line.created"));
    assert!(matches("order*", "order"));
    assert_eq!(
        matches("payments.*", "payments.order.created"),
        matches("payments.#", "payments.order.created")
    );
}

#[test]
fn test_lone_hash_matches_everything() {
    assert!(matches("#", "anything.at.all"));
    assert!(matches("#", ""));
}

#[test]
fn test_regex_metacharacters_are_literal() {
    assert!(matches("a+b.*", "a+b.c"));
    assert!(!matches("a+b.*", "aab.c"));
    assert!(!matches("payments.order", "paymentsXorder"));
}

#[test]
fn test_misplaced_hash_is_rejected() {
    assert_eq!(
        validate("pay#ments"),
        Err(PatternError::MisplacedHash("pay#ments".to_string()))
    );
    assert!(CompiledPattern::compile("a.#.b").is_err());
    assert!(!matches("pay#ments", "payabcments"));
}

#[test]
fn test_valid_hash_placements() {
    assert!(validate("#").is_ok());
    assert!(validate("#.created").is_ok());
    assert!(validate("payments.#").is_ok());
    assert!(validate("#.order.#").is_ok());
    assert!(validate("no.wildcards").is_ok());
}

#[test]
fn test_cache_reuses_compiled_patterns() {
    let cache = PatternCache::new();
    assert!(cache.is_empty());

    assert!(cache.matches("payments.*", "payments.order.created"));
    assert!(cache.matches("payments.*", "payments.order.canceled"));
    assert_eq!(cache.len(), 1);

    let first = cache.get("payments.*").unwrap();
    let second = cache.get("payments.*").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_cache_does_not_store_invalid_patterns() {
    let cache = PatternCache::new();
    assert!(!cache.matches("a#b", "a#b"));
    assert!(cache.is_empty());
}

#[test]
fn test_evicted_pattern_is_recompiled() {
    let cache = PatternCache::new();
    let first = cache.get("payments.*").unwrap();
    assert!(cache.evict("payments.*"));
    assert!(!cache.evict("payments.*"));
    assert!(cache.is_empty());

    let second = cache.get("payments.*").unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert!(second.is_match("payments.order.created"));
}
