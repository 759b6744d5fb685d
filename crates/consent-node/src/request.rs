//! Requester: run one transaction against a responder over TCP.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use consent_core::key_store::{FileKeyStore, KeyStore};
use consent_core::{Requester, TransactionDetails};
use consent_crypto::{Key32, Keychain};
use consent_transport::StreamConnection;

/// Everything needed to address a responder and phrase the request.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub responder_addr: String,
    pub responder_key: Option<String>,
    pub key_file: PathBuf,
    pub requester: String,
    pub details: TransactionDetails,
}

/// The responder's main key, from the command line or its key file.
pub async fn resolve_responder_key(plan: &RequestPlan) -> anyhow::Result<Key32> {
    match &plan.responder_key {
        Some(hex) => Key32::from_hex(hex).context("--responder-key is not a 32-byte hex key"),
        None => FileKeyStore::new(&plan.key_file)
            .read()
            .await
            .with_context(|| format!("reading responder key from {}", plan.key_file.display())),
    }
}

/// Connect, run both phases and return the released content.
pub async fn run(plan: &RequestPlan) -> anyhow::Result<String> {
    let responder = resolve_responder_key(plan).await?;
    let conn = StreamConnection::connect(plan.responder_addr.as_str())
        .await
        .with_context(|| format!("connecting to {}", plan.responder_addr))?;

    let keychain = Keychain::generate();
    info!(responder = %plan.responder_addr, "requesting data");
    let mut requester = Requester::new(conn, keychain, plan.requester.clone(), responder);
    let result = requester.request(&plan.details).await;
    requester.close().await?;
    Ok(result?)
}
