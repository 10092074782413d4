use std::sync::Arc;

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::utils::error::PatternError;

const WILDCARDS: [char; 2] = ['*', '#'];

pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(WILDCARDS)
}

/// Checks `#` placement: every `#` must be the first or the last character.
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    let last = pattern.chars().count().saturating_sub(1);
    let misplaced = pattern
        .chars()
        .enumerate()
        .any(|(i, c)| c == '#' && i != 0 && i != last);
    if misplaced {
        return Err(PatternError::MisplacedHash(pattern.to_string()));
    }
    Ok(())
}

/// Uncached one-shot match. Invalid patterns never match.
pub fn matches(pattern: &str, value: &str) -> bool {
    CompiledPattern::compile(pattern)
        .map(|p| p.is_match(value))
        .unwrap_or(false)
}

/// A pattern ready to be evaluated.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// No wildcards; compared case-insensitively.
    Exact(String),
    Wildcard(Regex),
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        validate(pattern)?;

        if !has_wildcards(pattern) {
            return Ok(CompiledPattern::Exact(pattern.to_lowercase()));
        }

        let body = pattern
            .split(WILDCARDS)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = RegexBuilder::new(&format!("^{body}$"))
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::Compile {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(CompiledPattern::Wildcard(regex))
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            CompiledPattern::Exact(expected) => expected == &value.to_lowercase(),
            CompiledPattern::Wildcard(regex) => regex.is_match(value),
        }
    }
}

/// Concurrent memo of compiled patterns keyed by pattern text.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: DashMap<String, Arc<CompiledPattern>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
        if let Some(hit) = self.compiled.get(pattern) {
            return Ok(hit.clone());
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern)?);
        Ok(self
            .compiled
            .entry(pattern.to_string())
            .or_insert(compiled)
            .clone())
    }

    /// Cached match. A pattern that fails to compile is logged and treated as
    /// a non-match.
    pub fn matches(&self, pattern: &str, value: &str) -> bool {
        match self.get(pattern) {
            Ok(compiled) => compiled.is_match(value),
            Err(e) => {
                warn!(pattern, error = %e, "Skipping unusable subscription pattern");
                false
            }
        }
    }

    /// Drops a compiled pattern; the next lookup compiles it again.
    pub fn evict(&self, pattern: &str) -> bool {
        self.compiled.remove(pattern).is_some()
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
