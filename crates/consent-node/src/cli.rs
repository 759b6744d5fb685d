//! CLI command definitions and argument parsing

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use consent_core::{EngineError, TransactionDetails};
use consent_transport::TransportError;

use crate::config::{AuthorizerKind, CliOverrides, NodeConfig};
use crate::request::RequestPlan;
use crate::ExitCode;

/// Consent node - broker personal data transactions
#[derive(Parser, Debug)]
#[command(name = "consent-node")]
#[command(version, about = "Consent node - broker personal data transactions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(long, global = true, env = "CONSENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "consent_core=debug"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// File holding the responder's public key
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a responder that answers transactions
    Respond(RespondArgs),
    /// Run one transaction against a responder
    Request(RequestArgs),
}

#[derive(Args, Debug)]
pub struct RespondArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<String>,

    /// Authorization plugin
    #[arg(long, value_enum)]
    pub authorizer: Option<AuthorizerKind>,

    /// Notification server base URL
    #[arg(long)]
    pub notification_url: Option<String>,

    /// Data service URL; demo data is served when unset
    #[arg(long)]
    pub data_service_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Responder address
    #[arg(long)]
    pub responder: String,

    /// Responder main public key (hex); read from the key file when unset
    #[arg(long)]
    pub responder_key: Option<String>,

    /// File containing the query
    #[arg(long)]
    pub query_file: PathBuf,

    /// Name shown to the data owner
    #[arg(long)]
    pub requester: String,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Legal basis shown as the reason for the request
    #[arg(long, default_value = "")]
    pub law: String,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            log_level: self.log_level.clone(),
            key_file: self.key_file.clone(),
            ..Default::default()
        };
        if let Commands::Respond(args) = &self.command {
            overrides.bind_addr = args.bind.clone();
            overrides.authorizer = args.authorizer;
            overrides.notification_url = args.notification_url.clone();
            overrides.data_service_url = args.data_service_url.clone();
        }
        overrides
    }

    /// File config (if any), then environment, then command line.
    pub fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::load_from_file(path)?.with_env(|key| std::env::var(key).ok()),
            None => NodeConfig::load_from_env(),
        };
        let config = base.with_overrides(&self.overrides());
        config.validate()?;
        Ok(config)
    }

    pub async fn execute_with_config(self, config: NodeConfig) -> anyhow::Result<ExitCode> {
        match self.command {
            Commands::Respond(_) => {
                crate::respond::run(&config).await?;
                Ok(ExitCode::Success)
            }
            Commands::Request(args) => {
                let query = tokio::fs::read_to_string(&args.query_file)
                    .await
                    .with_context(|| format!("reading {}", args.query_file.display()))?;
                let plan = RequestPlan {
                    responder_addr: args.responder,
                    responder_key: args.responder_key,
                    key_file: config.key_file(),
                    requester: args.requester,
                    details: TransactionDetails::new(query.trim())
                        .titled(args.title, args.description)
                        .under_law(args.law),
                };

                match crate::request::run(&plan).await {
                    Ok(content) => {
                        println!("{}", content);
                        Ok(ExitCode::Success)
                    }
                    Err(e) => match failure_exit_code(&e) {
                        Some(code) => {
                            eprintln!("Error: {e:#}");
                            Ok(code)
                        }
                        None => Err(e),
                    },
                }
            }
        }
    }
}

/// Exit code for failures the requester should report rather than raise.
fn failure_exit_code(error: &anyhow::Error) -> Option<ExitCode> {
    match error.downcast_ref::<EngineError>() {
        Some(EngineError::PreTransactionRejected) | Some(EngineError::TransactionRejected(_)) => {
            return Some(ExitCode::Rejected)
        }
        Some(EngineError::Transport(_)) => return Some(ExitCode::ConnectionFailed),
        _ => {}
    }
    error
        .downcast_ref::<TransportError>()
        .map(|_| ExitCode::ConnectionFailed)
}
