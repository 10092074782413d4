//! The `pattern` module matches subscription patterns against concrete
//! topics and event names.
//!
//! Patterns may contain two wildcards, `*` and `#`, and both match any run of
//! characters (including the empty run). `#` is only accepted as the first or
//! last character of a pattern. Matching ignores case.
//!
//! Compiled matchers are cached in a [`PatternCache`] because the same
//! subscription patterns are evaluated against every inbound message.

pub mod matcher;

pub use matcher::{CompiledPattern, PatternCache, has_wildcards, matches, validate};

#[cfg(test)]
mod tests;
