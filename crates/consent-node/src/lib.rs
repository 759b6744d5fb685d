//! Consent node - responder and requester for the consent protocol
//!
//! This crate provides a command-line interface for:
//! - Running a responder that brokers transactions over TCP
//! - Running a single transaction against a responder

pub mod cli;
pub mod config;
pub mod request;
pub mod respond;

pub use cli::Cli;
pub use config::{CliOverrides, ConfigError, NodeConfig};

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error
/// - 2: Transaction rejected by the responder
/// - 3: Connection to the responder failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    Rejected = 2,
    ConnectionFailed = 3,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }
}
