//! The `utils` module collects the pieces shared by every other module of
//! `hookhub`: the error taxonomy and logging initialization.
//!
//! Keeping them here gives all components one vocabulary for failures and a
//! single place where the tracing subscriber is configured.

pub mod error;
pub mod logging;
