use std::collections::HashSet;

use crate::broker::{BindingSpec, ExchangeKind};

/// An exchange and the queues bound to it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub auto_delete: bool,
    bindings: Vec<(String, String)>,
}

impl Exchange {
    pub fn new(name: &str, kind: ExchangeKind, durable: bool, auto_delete: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            durable,
            auto_delete,
            bindings: Vec::new(),
        }
    }

    /// Adds a binding. Binding the same queue with the same key twice has no effect.
    pub fn bind(&mut self, spec: &BindingSpec) {
        let binding = (spec.queue.clone(), spec.routing_key.clone());
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
    }

    pub fn is_bound(&self, queue: &str, binding_key: &str) -> bool {
        self.bindings
            .iter()
            .any(|(q, k)| q == queue && k == binding_key)
    }

    /// Queues that should receive a message with `routing_key`, each once.
    pub fn route(&self, routing_key: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.bindings
            .iter()
            .filter(|(_, binding_key)| match self.kind {
                ExchangeKind::Fanout => true,
                ExchangeKind::Direct => binding_key == routing_key,
                ExchangeKind::Topic => binding_key_matches(binding_key, routing_key),
            })
            .filter(|(queue, _)| seen.insert(queue.clone()))
            .map(|(queue, _)| queue.clone())
            .collect()
    }
}

/// AMQP topic matching: words are separated by `.`, `*` stands for exactly one
/// word and `#` for zero or more words.
pub fn binding_key_matches(binding_key: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = binding_key.split('.').collect();
    let words: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &words)
}

fn match_words(pattern: &[&str], words: &[&str]) -> bool {
    match pattern.split_first() {
        None => words.is_empty(),
        Some((&"#", rest)) => (0..=words.len()).any(|skip| match_words(rest, &words[skip..])),
        Some((&head, rest)) => match words.split_first() {
            Some((&word, remaining)) if head == "*" || head == word => {
                match_words(rest, remaining)
            }
            _ => false,
        },
    }
}
