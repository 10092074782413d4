//! The `persistence` module is hookhub's system of record.
//!
//! It stores message log entries, payload records and subscriptions in an
//! embedded `sled` database, one tree per entity. Writes that touch two rows
//! (a log entry and its payload, a subscription and its uniqueness index) run
//! in a sled transaction; single-row updates use compare-and-swap so
//! concurrent updates of the same row never overwrite each other.

pub mod messages;
pub mod sled_store;
pub mod subscriptions;

pub use sled_store::Persistence;

#[cfg(test)]
mod tests;
