//! Consent Core - transaction brokering between a requester and a data owner.
//!
//! This crate implements:
//! - The pending-transaction queue
//! - Query parsing into requested collections
//! - Authorization and pre-transaction validation plugins
//! - The responder handshake engine and the requester client
//! - Data service and key store boundaries

#![forbid(unsafe_code)]

// Handshake
pub mod engine;
pub mod requester;

// Services
pub mod plugins;
pub mod notification;
pub mod data_service;

// Infrastructure
pub mod queue;
pub mod query;
pub mod key_store;

// Supporting modules
pub mod errors;
pub mod types;
pub mod harness;

pub use engine::{Engine, EngineConfig, EngineHandle, EngineStatsSnapshot};
pub use errors::{EngineError, RejectReason};
pub use requester::{Requester, TransactionDetails};

#[cfg(test)]
mod proptests;
