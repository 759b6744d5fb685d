//! Test harness for the consent handshake.
//!
//! Canned authorization plugins and helpers that run a responder engine
//! and a requester over in-memory connections.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use consent_crypto::Keychain;
use consent_transport::testing::MemoryConnection;

use crate::data_service::{DataService, StaticDataService};
use crate::engine::{Engine, EngineConfig, EngineHandle};
use crate::errors::{AuthorizationError, EngineError};
use crate::plugins::{
    AuthorizationPlugin, PermissionNotificationRequest, PermissionNotificationResponse, Validators,
};
use crate::requester::{Requester, TransactionDetails};

/// Accepts every transaction.
pub struct AlwaysAccept;

#[async_trait]
impl AuthorizationPlugin for AlwaysAccept {
    async fn authorize(
        &self,
        request: &PermissionNotificationRequest,
    ) -> Result<PermissionNotificationResponse, AuthorizationError> {
        Ok(PermissionNotificationResponse {
            transaction_id: request.transaction_id.clone(),
            accepted: true,
        })
    }
}

/// Declines every transaction.
pub struct AlwaysReject;

#[async_trait]
impl AuthorizationPlugin for AlwaysReject {
    async fn authorize(
        &self,
        request: &PermissionNotificationRequest,
    ) -> Result<PermissionNotificationResponse, AuthorizationError> {
        Ok(PermissionNotificationResponse {
            transaction_id: request.transaction_id.clone(),
            accepted: false,
        })
    }
}

/// Accepts after a delay.
pub struct SlowAuthorizer(pub Duration);

#[async_trait]
impl AuthorizationPlugin for SlowAuthorizer {
    async fn authorize(
        &self,
        request: &PermissionNotificationRequest,
    ) -> Result<PermissionNotificationResponse, AuthorizationError> {
        tokio::time::sleep(self.0).await;
        AlwaysAccept.authorize(request).await
    }
}

/// Start an engine with standard validators.
pub fn spawn_engine(
    config: EngineConfig,
    authorization: Arc<dyn AuthorizationPlugin>,
    data_service: Arc<dyn DataService>,
) -> EngineHandle {
    Engine::new(config, authorization, Validators::standard(), data_service).spawn()
}

/// Submit one end of an in-memory pair to `engine` and return the other.
pub async fn connect(engine: &EngineHandle) -> Result<MemoryConnection, EngineError> {
    let (client, server) = MemoryConnection::pair();
    engine.submit(server).await?;
    Ok(client)
}

/// Run a complete transaction against an auto-accepting responder backed
/// by the demo data set.
///
/// 1. Responder engine starts
/// 2. Requester announces a fresh transaction
/// 3. Requester sends the signed query
/// 4. Responder authorizes and returns the data service content
pub async fn run_transaction_flow(details: &TransactionDetails) -> Result<String, EngineError> {
    let responder = Keychain::generate();
    let mut engine = spawn_engine(
        EngineConfig::default(),
        Arc::new(AlwaysAccept),
        Arc::new(StaticDataService::demo()),
    );

    let conn = connect(&engine).await?;
    let mut requester = Requester::new(
        conn,
        Keychain::generate(),
        "ACME Mortgages",
        responder.main_public_key(),
    );
    let content = requester.request(details).await?;

    requester.close().await?;
    engine.stop().await;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transaction_flow() {
        let details = TransactionDetails::new("{ personalDetails { name surname } }")
            .titled("Mortgage", "Identity check")
            .under_law("GDPR art. 6");

        let content = run_transaction_flow(&details)
            .await
            .expect("transaction flow should succeed");
        assert!(content.contains("personalDetails"));
    }
}
