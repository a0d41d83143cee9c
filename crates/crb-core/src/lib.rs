//! Core domain + application logic for the contact registration bridge.
//!
//! This crate is intentionally framework-agnostic. The messaging platform and the
//! identity/record backend live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod poller;
pub mod ports;
pub mod router;
pub mod run_state;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
